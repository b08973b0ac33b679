//! Internal passes of the layered layout pipeline.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{LayoutConfig, LayoutEdge, LayoutNode, NodePosition};

/// Adjacency view over the caller's nodes. Node IDs are assumed unique;
/// edges with unknown endpoints are dropped at build time.
pub(crate) struct Graph<'a> {
    nodes: &'a [LayoutNode],
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl<'a> Graph<'a> {
    pub(crate) fn build(nodes: &'a [LayoutNode], edges: &[LayoutEdge]) -> Self {
        let index_of: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for edge in edges {
            let (Some(&s), Some(&t)) = (
                index_of.get(edge.source.as_str()),
                index_of.get(edge.target.as_str()),
            ) else {
                continue;
            };
            outgoing[s].push(t);
            incoming[t].push(s);
        }

        Graph {
            nodes,
            outgoing,
            incoming,
        }
    }

    /// Longest-path layering: a node's layer is one past its deepest
    /// predecessor; sources land on layer 0. A visiting mark breaks out of
    /// cycles should the input ever contain one.
    pub(crate) fn assign_layers(&self) -> Vec<usize> {
        let mut memo: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut visiting = vec![false; self.nodes.len()];
        for i in 0..self.nodes.len() {
            self.layer_of(i, &mut memo, &mut visiting);
        }
        memo.into_iter().map(|l| l.unwrap_or(0)).collect()
    }

    fn layer_of(&self, i: usize, memo: &mut Vec<Option<usize>>, visiting: &mut Vec<bool>) -> usize {
        if let Some(layer) = memo[i] {
            return layer;
        }
        if visiting[i] {
            // Back edge: treat the node as a source for this path.
            return 0;
        }
        visiting[i] = true;
        let layer = self.incoming[i]
            .iter()
            .map(|&p| self.layer_of(p, memo, visiting) + 1)
            .max()
            .unwrap_or(0);
        visiting[i] = false;
        memo[i] = Some(layer);
        layer
    }

    /// Buckets node indices per layer, preserving input order inside each
    /// bucket (the deterministic starting order for the sweeps).
    pub(crate) fn group_by_layer(&self, layers: &[usize]) -> Vec<Vec<usize>> {
        let max_layer = layers.iter().copied().max().unwrap_or(0);
        let mut ordering: Vec<Vec<usize>> = vec![Vec::new(); max_layer + 1];
        for (i, &layer) in layers.iter().enumerate() {
            ordering[layer].push(i);
        }
        ordering
    }

    /// Barycenter crossing reduction: alternating downward/upward sweeps
    /// reorder each layer by the mean position of its neighbors in the
    /// fixed adjacent layer. Nodes without neighbors keep their slot. The
    /// sort is stable, so the whole pass is deterministic.
    pub(crate) fn order_by_barycenter(&self, ordering: &mut [Vec<usize>], sweeps: usize) {
        let mut pos = vec![0.0f64; self.nodes.len()];
        for layer in ordering.iter() {
            for (slot, &i) in layer.iter().enumerate() {
                pos[i] = slot as f64;
            }
        }

        for sweep in 0..sweeps {
            let downward = sweep % 2 == 0;
            let layer_indices: Vec<usize> = if downward {
                (1..ordering.len()).collect()
            } else {
                (0..ordering.len().saturating_sub(1)).rev().collect()
            };

            for li in layer_indices {
                let mut keyed: Vec<(usize, f64)> = ordering[li]
                    .iter()
                    .map(|&i| {
                        let neighbors = if downward {
                            &self.incoming[i]
                        } else {
                            &self.outgoing[i]
                        };
                        let bary = if neighbors.is_empty() {
                            pos[i]
                        } else {
                            neighbors.iter().map(|&n| pos[n]).sum::<f64>()
                                / neighbors.len() as f64
                        };
                        (i, bary)
                    })
                    .collect();

                keyed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
                ordering[li] = keyed.iter().map(|(i, _)| *i).collect();
                for (slot, &(i, _)) in keyed.iter().enumerate() {
                    pos[i] = slot as f64;
                }
            }
        }
    }

    /// Final coordinate assignment. Layers are centered on the widest
    /// layer; inside a layer nodes advance by their own width plus the
    /// configured separator. Layer heights step by the tallest node.
    pub(crate) fn assign_coordinates(
        &self,
        ordering: &[Vec<usize>],
        config: &LayoutConfig,
    ) -> IndexMap<String, NodePosition> {
        let layer_width = |layer: &[usize]| -> f64 {
            if layer.is_empty() {
                return 0.0;
            }
            let widths: f64 = layer.iter().map(|&i| self.nodes[i].width).sum();
            widths + (layer.len() - 1) as f64 * config.node_sep
        };
        let max_width = ordering.iter().map(|l| layer_width(l)).fold(0.0, f64::max);

        let mut coords: Vec<(f64, f64)> = vec![(0.0, 0.0); self.nodes.len()];
        let mut y = 0.0;
        for layer in ordering {
            let mut x = (max_width - layer_width(layer)) / 2.0;
            let mut tallest = 0.0f64;
            for &i in layer {
                coords[i] = (x, y);
                x += self.nodes[i].width + config.node_sep;
                tallest = tallest.max(self.nodes[i].height);
            }
            y += tallest + config.rank_sep;
        }

        // Key the result in input node order for stable iteration.
        let mut result = IndexMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let (x, y) = coords[i];
            result.insert(
                node.id.clone(),
                NodePosition {
                    x,
                    y,
                    width: node.width,
                    height: node.height,
                },
            );
        }
        result
    }
}
