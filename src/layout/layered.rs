use super::{LayoutEngine, LayoutError, LayoutRequest, NodePositions};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

const ORDER_PASSES: usize = 4;

/// Deterministic longest-path layering with barycenter ordering.
///
/// Edges that close a cycle (typically jumps back to an earlier step) do not
/// influence ranking; edges to undeclared ids are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredEngine;

impl LayoutEngine for LayeredEngine {
    fn layout(&self, request: &LayoutRequest) -> Result<NodePositions, LayoutError> {
        let mut positions = NodePositions::new();
        if request.nodes.is_empty() {
            return Ok(positions);
        }

        let node_ids: Vec<&str> = request.nodes.iter().map(|node| node.id.as_str()).collect();
        let sizes: HashMap<&str, (f32, f32)> = request
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), (node.width, node.height)))
            .collect();
        let node_set: HashSet<&str> = node_ids.iter().copied().collect();
        let edges: Vec<(&str, &str)> = request
            .edges
            .iter()
            .map(|edge| (edge.source.as_str(), edge.target.as_str()))
            .filter(|(from, to)| node_set.contains(from) && node_set.contains(to) && from != to)
            .collect();

        let ranks = compute_ranks(&node_ids, &edges);
        let max_rank = ranks.values().copied().max().unwrap_or(0);
        let mut rank_nodes: Vec<Vec<&str>> = vec![Vec::new(); max_rank + 1];
        for &id in &node_ids {
            let rank = ranks.get(id).copied().unwrap_or(0);
            rank_nodes[rank].push(id);
        }
        order_rank_nodes(&mut rank_nodes, &edges, &ranks);

        let options = &request.options;
        let row_widths: Vec<f32> = rank_nodes
            .iter()
            .map(|bucket| {
                let widths: f32 = bucket.iter().map(|id| sizes[id].0).sum();
                widths + options.node_spacing * bucket.len().saturating_sub(1) as f32
            })
            .collect();
        let widest = row_widths.iter().copied().fold(0.0_f32, f32::max);

        let mut centers: HashMap<&str, (f32, f32)> = HashMap::new();
        let mut cursor_y = options.margin_y;
        for (bucket, row_width) in rank_nodes.iter().zip(&row_widths) {
            let row_height = bucket.iter().map(|id| sizes[id].1).fold(0.0_f32, f32::max);
            let mut cursor_x = options.margin_x + (widest - row_width) / 2.0;
            for &id in bucket {
                let (width, _) = sizes[id];
                centers.insert(id, (cursor_x + width / 2.0, cursor_y + row_height / 2.0));
                cursor_x += width + options.node_spacing;
            }
            cursor_y += row_height + options.rank_spacing;
        }

        for id in &node_ids {
            if let Some(center) = centers.get(id) {
                positions.insert(id.to_string(), *center);
            }
        }
        Ok(positions)
    }
}

fn compute_ranks<'a>(node_ids: &[&'a str], edges: &[(&'a str, &'a str)]) -> HashMap<&'a str, usize> {
    let mut indeg: HashMap<&str, usize> = node_ids.iter().map(|id| (*id, 0)).collect();
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for &(from, to) in edges {
        adj.entry(from).or_default().push(to);
        *indeg.entry(to).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&str> = node_ids
        .iter()
        .copied()
        .filter(|id| indeg.get(id).copied() == Some(0))
        .collect();

    let mut order = Vec::with_capacity(node_ids.len());
    while let Some(node) = queue.pop_front() {
        order.push(node);
        if let Some(nexts) = adj.get(node) {
            for next in nexts {
                if let Some(deg) = indeg.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }
    }

    // Nodes on cycles never reach zero in-degree; rank them after the rest in
    // declaration order.
    if order.len() < node_ids.len() {
        let seen: HashSet<&str> = order.iter().copied().collect();
        order.extend(node_ids.iter().copied().filter(|id| !seen.contains(id)));
    }

    let order_index: HashMap<&str, usize> =
        order.iter().enumerate().map(|(idx, id)| (*id, idx)).collect();

    let mut ranks: HashMap<&str, usize> = HashMap::new();
    for &node in &order {
        let rank = *ranks.entry(node).or_insert(0);
        let Some(nexts) = adj.get(node) else {
            continue;
        };
        let from_idx = order_index[node];
        for &next in nexts {
            if order_index[next] <= from_idx {
                continue;
            }
            let entry = ranks.entry(next).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }

    ranks
}

fn order_rank_nodes(rank_nodes: &mut [Vec<&str>], edges: &[(&str, &str)], ranks: &HashMap<&str, usize>) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for &(from, to) in edges {
        // Only edges between adjacent ranks pull on ordering.
        if ranks[to] != ranks[from] + 1 {
            continue;
        }
        outgoing.entry(from).or_default().push(to);
        incoming.entry(to).or_default().push(from);
    }

    for pass in 0..ORDER_PASSES {
        let downward = pass % 2 == 0;
        let indices: Vec<usize> = if downward {
            (1..rank_nodes.len()).collect()
        } else {
            (0..rank_nodes.len() - 1).rev().collect()
        };
        for idx in indices {
            let (fixed_idx, neighbors) = if downward {
                (idx - 1, &incoming)
            } else {
                (idx + 1, &outgoing)
            };
            let fixed: HashMap<&str, usize> = rank_nodes[fixed_idx]
                .iter()
                .enumerate()
                .map(|(pos, id)| (*id, pos))
                .collect();
            sort_by_barycenter(&mut rank_nodes[idx], neighbors, &fixed);
        }
    }
}

fn sort_by_barycenter(bucket: &mut [&str], neighbors: &HashMap<&str, Vec<&str>>, fixed: &HashMap<&str, usize>) {
    let current: HashMap<&str, usize> = bucket.iter().enumerate().map(|(pos, id)| (*id, pos)).collect();
    let barycenter = |id: &str| -> f32 {
        let positions: Vec<usize> = neighbors
            .get(id)
            .map(|list| list.iter().filter_map(|n| fixed.get(n).copied()).collect())
            .unwrap_or_default();
        if positions.is_empty() {
            current[id] as f32
        } else {
            positions.iter().sum::<usize>() as f32 / positions.len() as f32
        }
    };
    bucket.sort_by(|a, b| {
        barycenter(*a)
            .partial_cmp(&barycenter(*b))
            .unwrap_or(Ordering::Equal)
            .then_with(|| current[a].cmp(&current[b]))
    });
}
