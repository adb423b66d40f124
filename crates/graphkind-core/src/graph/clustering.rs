//! Average local clustering coefficient on the undirected view.
//!
//! For a node `v` with `k >= 2` distinct neighbours (self excluded) and `t`
//! edges among those neighbours, `c(v) = 2t / (k (k - 1))`; nodes with fewer
//! than two neighbours score 0. The average is taken over every node.
//! Runs in `O(sum of squared degrees)`.

use std::collections::HashSet;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::edges::NodeId;

/// Mean local clustering coefficient, or `None` for the null graph.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_clustering(graph: &UnGraph<NodeId, ()>) -> Option<f64> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }

    let neighbours: Vec<HashSet<NodeIndex>> = graph
        .node_indices()
        .map(|v| graph.neighbors(v).filter(|&u| u != v).collect())
        .collect();

    let total: f64 = graph
        .node_indices()
        .map(|v| {
            let own = &neighbours[v.index()];
            let k = own.len();
            if k < 2 {
                return 0.0;
            }
            // Each neighbour-neighbour edge is seen from both ends.
            let twice_links: usize = own
                .iter()
                .map(|u| neighbours[u.index()].intersection(own).count())
                .sum();
            twice_links as f64 / (k * (k - 1)) as f64
        })
        .sum();

    Some(total / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::EdgeList;
    use crate::graph::GraphViews;

    fn clustering(pairs: &[(i64, i64)]) -> Option<f64> {
        let views = GraphViews::from_edges(&EdgeList::from_pairs(pairs.iter().copied()));
        average_clustering(&views.undirected)
    }

    #[test]
    fn null_graph_is_undefined() {
        assert_eq!(clustering(&[]), None);
    }

    #[test]
    fn triangle_is_fully_clustered() {
        let c = clustering(&[(0, 1), (1, 2), (2, 0)]).unwrap();
        assert!((c - 1.0).abs() < 1e-12);
    }

    #[test]
    fn path_has_zero_clustering() {
        let c = clustering(&[(0, 1), (1, 2), (2, 3)]).unwrap();
        assert!(c.abs() < 1e-12);
    }

    #[test]
    fn triangle_with_pendant() {
        // Triangle 0-1-2 plus pendant 2-3.
        // c(0)=1, c(1)=1, c(2)=1/3, c(3)=0 → mean = 7/12.
        let c = clustering(&[(0, 1), (1, 2), (2, 0), (2, 3)]).unwrap();
        assert!((c - 7.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn self_loops_are_ignored() {
        let with_loop = clustering(&[(0, 1), (1, 2), (2, 0), (0, 0)]).unwrap();
        assert!((with_loop - 1.0).abs() < 1e-12);
    }
}
