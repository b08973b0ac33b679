//! Hierarchical (layered) graph layout for skill trees.
//!
//! Implements the classic Sugiyama pipeline for top-to-bottom DAG drawing:
//!
//! 1. Layer assignment by longest path from the sources.
//! 2. Crossing reduction inside layers via barycenter sweeps.
//! 3. Coordinate assignment honoring per-node widths and spacing.
//!
//! The engine knows nothing about skills: it consumes abstract nodes
//! (`id`, `width`, `height`) and directed edges and produces a position per
//! node. Every edge points from a strictly lower layer to a strictly higher
//! one, so parents always render above children. Exact crossing
//! minimization is NP-hard; the barycenter heuristic is the standard
//! compromise. The whole pass is deterministic for identical input.

mod layered;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node to be placed. Width varies with the rendered label; height is
/// uniform in practice but not assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

/// A directed edge between two node IDs. Edges whose endpoints are unknown
/// are ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
}

/// Final position of a node. `x`/`y` are the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodePosition {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Spacing knobs for the layout.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Minimum horizontal gap between neighboring nodes in a layer.
    pub node_sep: f64,
    /// Vertical gap between consecutive layers.
    pub rank_sep: f64,
    /// Number of barycenter ordering sweeps.
    pub sweeps: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            node_sep: 120.0,
            rank_sep: 160.0,
            sweeps: 4,
        }
    }
}

/// Lays out `nodes` with default spacing.
///
/// Returns one position per input node, keyed by ID, in input order.
/// Empty input yields an empty map.
pub fn layout(nodes: &[LayoutNode], edges: &[LayoutEdge]) -> IndexMap<String, NodePosition> {
    layout_with_config(nodes, edges, &LayoutConfig::default())
}

/// Lays out `nodes` with explicit spacing configuration.
pub fn layout_with_config(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    config: &LayoutConfig,
) -> IndexMap<String, NodePosition> {
    if nodes.is_empty() {
        return IndexMap::new();
    }

    let graph = layered::Graph::build(nodes, edges);
    let layers = graph.assign_layers();
    let mut ordering = graph.group_by_layer(&layers);
    graph.order_by_barycenter(&mut ordering, config.sweeps);
    graph.assign_coordinates(&ordering, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node(id: &str) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            width: 220.0,
            height: 72.0,
        }
    }

    fn edge(source: &str, target: &str) -> LayoutEdge {
        LayoutEdge {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = layout(&[], &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn single_node_is_placed() {
        let result = layout(&[node("a")], &[]);
        let pos = &result["a"];
        assert_eq!(pos.width, 220.0);
        assert_eq!(pos.height, 72.0);
    }

    #[test]
    fn parents_sit_strictly_above_children() {
        let result = layout(
            &[node("1"), node("2"), node("3")],
            &[edge("1", "2"), edge("2", "3")],
        );
        assert!(result["1"].y < result["2"].y);
        assert!(result["2"].y < result["3"].y);
    }

    #[test]
    fn linear_chain_is_vertically_aligned() {
        let result = layout(
            &[node("a"), node("b"), node("c")],
            &[edge("a", "b"), edge("b", "c")],
        );
        assert!((result["a"].center_x() - result["b"].center_x()).abs() < 1.0);
        assert!((result["b"].center_x() - result["c"].center_x()).abs() < 1.0);
    }

    #[test]
    fn diamond_siblings_share_a_layer_without_overlap() {
        let result = layout(
            &[node("a"), node("b"), node("c"), node("d")],
            &[edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
        );
        assert!((result["b"].y - result["c"].y).abs() < f64::EPSILON);
        let (left, right) = if result["b"].x < result["c"].x {
            (&result["b"], &result["c"])
        } else {
            (&result["c"], &result["b"])
        };
        assert!(right.x >= left.x + left.width, "siblings must not overlap");
        assert!(result["a"].y < result["b"].y);
        assert!(result["b"].y < result["d"].y);
    }

    #[test]
    fn disconnected_components_and_isolated_nodes_get_positions() {
        let result = layout(
            &[node("a"), node("b"), node("x"), node("y"), node("lone")],
            &[edge("a", "b"), edge("x", "y")],
        );
        assert_eq!(result.len(), 5);
        // Sources of both components plus the isolated node land on layer 0
        // side by side, without overlap.
        let mut layer0: Vec<&NodePosition> = ["a", "x", "lone"]
            .iter()
            .map(|id| &result[*id])
            .collect();
        layer0.sort_by(|p, q| p.x.partial_cmp(&q.x).unwrap());
        for pair in layer0.windows(2) {
            assert!(pair[1].x >= pair[0].x + pair[0].width);
        }
    }

    #[test]
    fn wider_labels_widen_spacing() {
        let wide = LayoutNode {
            id: "wide".into(),
            width: 400.0,
            height: 72.0,
        };
        let result = layout(
            &[node("root"), wide.clone(), node("narrow")],
            &[edge("root", "wide"), edge("root", "narrow")],
        );
        let gap = (result["wide"].center_x() - result["narrow"].center_x()).abs();
        // Centers must be at least half of each width plus the separator apart.
        assert!(gap >= (400.0 + 220.0) / 2.0);
    }

    #[test]
    fn barycenter_preserves_parallel_ordering() {
        // Two independent chains: children should not swap sides relative
        // to their parents (that would introduce a crossing).
        let result = layout(
            &[node("a1"), node("a2"), node("b1"), node("b2")],
            &[edge("a1", "b1"), edge("a2", "b2")],
        );
        let parents_ordered = result["a1"].x < result["a2"].x;
        let children_ordered = result["b1"].x < result["b2"].x;
        assert_eq!(parents_ordered, children_ordered);
    }

    #[test]
    fn unknown_edge_endpoints_are_ignored() {
        let result = layout(&[node("a"), node("b")], &[edge("a", "ghost"), edge("a", "b")]);
        assert_eq!(result.len(), 2);
        assert!(result["a"].y < result["b"].y);
    }

    #[test]
    fn cyclic_input_still_terminates() {
        // The engine is only ever fed DAGs, but it must not hang if that
        // assumption is violated upstream.
        let result = layout(&[node("a"), node("b")], &[edge("a", "b"), edge("b", "a")]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let nodes = [node("1"), node("2"), node("3"), node("4")];
        let edges = [edge("1", "2"), edge("1", "3"), edge("3", "4")];
        let first = layout(&nodes, &edges);
        let second = layout(&nodes, &edges);
        assert_eq!(first, second);
    }

    proptest! {
        /// Every edge of a random DAG points strictly downward, and nodes
        /// sharing a layer never overlap horizontally.
        #[test]
        fn edges_point_downward_in_random_dags(
            n in 1..12usize,
            raw_edges in prop::collection::vec((0..12usize, 0..12usize), 0..24),
        ) {
            let nodes: Vec<LayoutNode> = (0..n).map(|i| node(&i.to_string())).collect();
            // Orient every pair low -> high so the input is acyclic.
            let edges: Vec<LayoutEdge> = raw_edges
                .into_iter()
                .filter(|(a, b)| a < b && *b < n)
                .map(|(a, b)| edge(&a.to_string(), &b.to_string()))
                .collect();

            let result = layout(&nodes, &edges);
            prop_assert_eq!(result.len(), n);

            for e in &edges {
                prop_assert!(result[&e.source].y < result[&e.target].y);
            }

            // Group by y and check horizontal separation.
            let mut by_layer: std::collections::BTreeMap<i64, Vec<NodePosition>> =
                std::collections::BTreeMap::new();
            for pos in result.values() {
                by_layer.entry(pos.y as i64).or_default().push(*pos);
            }
            for row in by_layer.values_mut() {
                row.sort_by(|p, q| p.x.partial_cmp(&q.x).unwrap());
                for pair in row.windows(2) {
                    prop_assert!(pair[1].x >= pair[0].x + pair[0].width - 1e-9);
                }
            }
        }
    }
}
