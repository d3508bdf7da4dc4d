use super::{LayoutEngine, LayoutError, LayoutRequest, NodePositions};
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use log::debug;
use std::collections::HashSet;

/// Hierarchical layout through the dagre port.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagreEngine;

impl LayoutEngine for DagreEngine {
    fn layout(&self, request: &LayoutRequest) -> Result<NodePositions, LayoutError> {
        let mut positions = NodePositions::new();
        if request.nodes.is_empty() {
            return Ok(positions);
        }

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let options = &request.options;
        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some(options.rank_dir.as_dagre().to_string());
        graph_config.nodesep = Some(options.node_spacing);
        graph_config.ranksep = Some(options.rank_spacing);
        graph_config.marginx = Some(options.margin_x);
        graph_config.marginy = Some(options.margin_y);
        dagre_graph.set_graph(graph_config);

        for layout_node in &request.nodes {
            let mut node = DagreNode::default();
            node.width = layout_node.width;
            node.height = layout_node.height;
            dagre_graph.set_node(layout_node.id.clone(), Some(node));
        }

        // dagre would create unsized nodes for unknown endpoints, so edges
        // touching undeclared ids stay out of the layout graph.
        let node_set: HashSet<&String> = request.nodes.iter().map(|node| &node.id).collect();
        let mut edge_set: HashSet<(&String, &String)> = HashSet::new();
        for edge in &request.edges {
            let (from, to) = (&edge.source, &edge.target);
            if !node_set.contains(from) || !node_set.contains(to) {
                debug!(source = from.as_str(), target = to.as_str(); "skipping dangling edge in dagre layout");
                continue;
            }
            if !edge_set.insert((from, to)) {
                continue;
            }
            let edge_label = DagreEdge::default();
            let _ = dagre_graph.set_edge(from, to, Some(edge_label), None);
        }

        dagre_layout::run_layout(&mut dagre_graph);

        for layout_node in &request.nodes {
            let Some(dagre_node) = dagre_graph.node(&layout_node.id) else {
                continue;
            };
            positions.insert(layout_node.id.clone(), (dagre_node.x, dagre_node.y));
        }

        Ok(positions)
    }
}
