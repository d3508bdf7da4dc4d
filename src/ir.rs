use crate::sizing::SizingConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const EDGE_STROKE: &str = "#fff";
pub const JUMP_DASHARRAY: &str = "5,5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Step,
    Transition,
}

impl NodeKind {
    /// The kind whose declaration may implicitly chain from this one.
    pub fn opposite(self) -> Self {
        match self {
            Self::Step => Self::Transition,
            Self::Transition => Self::Step,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum NodeContent {
    Step { label: String, actions: Vec<String> },
    Transition { label: String, condition: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SclNode {
    pub id: String,
    #[serde(flatten)]
    pub content: NodeContent,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub position: Position,
}

impl SclNode {
    pub fn new(id: &str, kind: NodeKind, sizing: &SizingConfig) -> Self {
        let content = match kind {
            NodeKind::Step => NodeContent::Step {
                label: id.to_string(),
                actions: Vec::new(),
            },
            NodeKind::Transition => NodeContent::Transition {
                label: id.to_string(),
                condition: String::new(),
            },
        };
        let (width, height) = sizing.rendered_size(&content);
        Self {
            id: id.to_string(),
            content,
            width,
            height,
            position: Position::default(),
        }
    }

    pub fn step(id: &str, sizing: &SizingConfig) -> Self {
        Self::new(id, NodeKind::Step, sizing)
    }

    pub fn transition(id: &str, sizing: &SizingConfig) -> Self {
        Self::new(id, NodeKind::Transition, sizing)
    }

    pub fn kind(&self) -> NodeKind {
        match self.content {
            NodeContent::Step { .. } => NodeKind::Step,
            NodeContent::Transition { .. } => NodeKind::Transition,
        }
    }

    pub fn is_step(&self) -> bool {
        self.kind() == NodeKind::Step
    }

    pub fn is_transition(&self) -> bool {
        self.kind() == NodeKind::Transition
    }

    pub fn label(&self) -> &str {
        match &self.content {
            NodeContent::Step { label, .. } | NodeContent::Transition { label, .. } => label,
        }
    }

    pub fn set_label(&mut self, value: impl Into<String>) {
        match &mut self.content {
            NodeContent::Step { label, .. } | NodeContent::Transition { label, .. } => {
                *label = value.into();
            }
        }
    }

    /// Step actions; always empty for transitions.
    pub fn actions(&self) -> &[String] {
        match &self.content {
            NodeContent::Step { actions, .. } => actions,
            NodeContent::Transition { .. } => &[],
        }
    }

    pub fn condition(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Transition { condition, .. } => Some(condition),
            NodeContent::Step { .. } => None,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Sequential,
    Jump,
}

/// Edge component the diagram canvas uses to draw the edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRenderer {
    #[default]
    Draggable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
}

impl EdgeStyle {
    pub fn for_kind(kind: EdgeKind) -> Self {
        Self {
            stroke: EDGE_STROKE.to_string(),
            stroke_dasharray: match kind {
                EdgeKind::Sequential => None,
                EdgeKind::Jump => Some(JUMP_DASHARRAY.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    #[default]
    #[serde(rename = "arrowclosed")]
    ArrowClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeMarker {
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    pub color: String,
}

impl Default for EdgeMarker {
    fn default() -> Self {
        Self {
            kind: MarkerKind::ArrowClosed,
            color: EDGE_STROKE.to_string(),
        }
    }
}

/// Segment offsets of an orthogonally routed edge. Created zeroed; only the
/// diagram canvas moves them afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeOffset {
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y1: f32,
    #[serde(default)]
    pub offset_y2: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SclEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub renderer: EdgeRenderer,
    #[serde(rename = "animated", with = "jump_flag")]
    pub kind: EdgeKind,
    pub style: EdgeStyle,
    #[serde(default)]
    pub marker_end: EdgeMarker,
    #[serde(rename = "data", default)]
    pub offset: EdgeOffset,
}

impl SclEdge {
    pub fn new(source: &str, target: &str, kind: EdgeKind) -> Self {
        Self {
            id: edge_id(source, target),
            source: source.to_string(),
            target: target.to_string(),
            renderer: EdgeRenderer::Draggable,
            kind,
            style: EdgeStyle::for_kind(kind),
            marker_end: EdgeMarker::default(),
            offset: EdgeOffset::default(),
        }
    }

    pub fn is_jump(&self) -> bool {
        self.kind == EdgeKind::Jump
    }
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("e-{source}-{target}")
}

/// Jump edges are persisted as `"animated": true`.
mod jump_flag {
    use super::EdgeKind;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(kind: &EdgeKind, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*kind == EdgeKind::Jump)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EdgeKind, D::Error> {
        let animated = bool::deserialize(deserializer)?;
        Ok(if animated {
            EdgeKind::Jump
        } else {
            EdgeKind::Sequential
        })
    }
}

/// Node registry and edge set produced by one compile run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chart {
    pub nodes: IndexMap<String, SclNode>,
    /// Keyed by edge id, so two pairs that spell the same id collapse.
    edges: IndexMap<String, SclEdge>,
}

impl Chart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&SclNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut SclNode> {
        self.nodes.get_mut(id)
    }

    /// Registers `node`, replacing any node of the same id wholesale. The
    /// replaced node keeps its slot in declaration order.
    pub fn declare_node(&mut self, node: SclNode) -> Option<SclNode> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Adds `source -> target` unless an edge with the same id already
    /// exists. Returns whether the edge was inserted; the first declaration
    /// wins, so edge ids stay unique even when `-` in node names makes two
    /// pairs spell the same id.
    pub fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind) -> bool {
        if source.is_empty() || target.is_empty() {
            return false;
        }
        let id = edge_id(source, target);
        if self.edges.contains_key(&id) {
            return false;
        }
        self.edges.insert(id, SclEdge::new(source, target, kind));
        true
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&SclEdge> {
        self.edges
            .get(&edge_id(source, target))
            .filter(|edge| edge.source == source && edge.target == target)
    }

    pub fn edge_by_id(&self, id: &str) -> Option<&SclEdge> {
        self.edges.get(id)
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edge(source, target).is_some()
    }

    pub fn edges(&self) -> impl Iterator<Item = &SclEdge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges whose source or target was never declared.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &SclEdge> {
        self.edges
            .values()
            .filter(|edge| !self.nodes.contains_key(&edge.source) || !self.nodes.contains_key(&edge.target))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// The node and edge lists handed to rendering and storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub nodes: Vec<SclNode>,
    pub edges: Vec<SclEdge>,
}

impl Diagram {
    pub fn node(&self, id: &str) -> Option<&SclNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&SclEdge> {
        self.edges
            .iter()
            .find(|edge| edge.source == source && edge.target == target)
    }
}

impl From<Chart> for Diagram {
    fn from(chart: Chart) -> Self {
        Self {
            nodes: chart.nodes.into_values().collect(),
            edges: chart.edges.into_values().collect(),
        }
    }
}
