//! Layout-request assembly and the seam to graph-layout engines.
//!
//! The compiler sizes every node, hands the sized graph to a [`LayoutEngine`]
//! and converts the center anchors it returns into top-left positions using
//! each node's rendered footprint.

mod dagre;
mod error;
mod layered;

pub use dagre::DagreEngine;
pub use error::LayoutError;
pub use layered::LayeredEngine;

use crate::config::LayoutConfig;
use crate::ir::{Chart, Diagram, Position};
use crate::sizing::SizingConfig;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Dagre,
    Layered,
}

impl EngineKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "dagre" => Some(Self::Dagre),
            "layered" => Some(Self::Layered),
            _ => None,
        }
    }

    pub fn engine(self) -> Box<dyn LayoutEngine> {
        match self {
            Self::Dagre => Box::new(DagreEngine),
            Self::Layered => Box::new(LayeredEngine),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankDir {
    #[default]
    TopBottom,
}

impl RankDir {
    pub fn as_dagre(self) -> &'static str {
        match self {
            Self::TopBottom => "TB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub rank_dir: RankDir,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub margin_x: f32,
    pub margin_y: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutConfig::default().options()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRequest {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub options: LayoutOptions,
}

impl LayoutRequest {
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }
}

/// Center anchor per node id.
pub type NodePositions = IndexMap<String, (f32, f32)>;

/// A graph-layout algorithm: sized nodes and directed edges in, node centers out.
///
/// Every submitted node must receive a position, including nodes no edge
/// touches. Edges may name ids that are not among the submitted nodes; how an
/// engine treats those is its own business, but it must not fail on them.
pub trait LayoutEngine {
    fn layout(&self, request: &LayoutRequest) -> Result<NodePositions, LayoutError>;
}

pub fn build_request(chart: &Chart, sizing: &SizingConfig, options: LayoutOptions) -> LayoutRequest {
    let nodes = chart
        .nodes
        .values()
        .map(|node| {
            let (width, height) = sizing.layout_size(node);
            LayoutNode {
                id: node.id.clone(),
                width,
                height,
            }
        })
        .collect();
    let edges = chart
        .edges()
        .map(|edge| LayoutEdge {
            source: edge.source.clone(),
            target: edge.target.clone(),
        })
        .collect();
    LayoutRequest {
        nodes,
        edges,
        options,
    }
}

/// Converts center anchors into top-left positions using rendered (not
/// layout-reserved) sizes.
pub fn apply_positions(chart: &Chart, positions: &NodePositions) -> Result<Diagram, LayoutError> {
    let mut diagram = Diagram::from(chart.clone());
    for node in &mut diagram.nodes {
        let &(cx, cy) = positions
            .get(&node.id)
            .ok_or_else(|| LayoutError::MissingPosition(node.id.clone()))?;
        if !cx.is_finite() || !cy.is_finite() {
            return Err(LayoutError::NonFinite(node.id.clone()));
        }
        node.position = Position {
            x: cx - node.width / 2.0,
            y: cy - node.height / 2.0,
        };
    }
    Ok(diagram)
}

pub fn layout_chart(
    chart: &Chart,
    engine: &dyn LayoutEngine,
    sizing: &SizingConfig,
    options: LayoutOptions,
) -> Result<Diagram, LayoutError> {
    let request = build_request(chart, sizing, options);
    let positions = engine.layout(&request)?;
    debug!(nodes = request.nodes.len(), edges = request.edges.len(); "layout computed");
    apply_positions(chart, &positions)
}
