//! Graph construction from an edge list.
//!
//! # Views
//!
//! [`GraphViews`] carries two petgraph graphs over the same node set (the
//! union of all edge endpoints):
//!
//! - `directed`: the edge list read as arcs. Repeated `(source, target)`
//!   pairs collapse to a single arc.
//! - `undirected`: direction discarded. Parallel and anti-parallel edges
//!   collapse to one undirected edge. Used only for the tree, forest and
//!   clustering measurements.
//!
//! Both graphs use the same [`NodeIndex`] for a given [`NodeId`].
//!
//! ## Content Hash
//!
//! `content_hash` is a BLAKE3 hash of the sorted, de-duplicated arc set. It
//! is independent of edge order and multiplicity and identifies the graph in
//! logs.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use tracing::instrument;

use crate::edges::{EdgeList, NodeId};

// ---------------------------------------------------------------------------
// GraphViews
// ---------------------------------------------------------------------------

/// Directed and undirected views of one edge list.
#[derive(Debug, Clone)]
pub struct GraphViews {
    /// Directed graph: nodes = identifiers, edges = distinct arcs.
    pub directed: DiGraph<NodeId, ()>,
    /// Undirected graph over the same node indices.
    pub undirected: UnGraph<NodeId, ()>,
    /// Mapping from identifier to petgraph `NodeIndex` (shared by both views).
    pub node_map: BTreeMap<NodeId, NodeIndex>,
    /// BLAKE3 content hash of the arc set.
    pub content_hash: String,
}

impl GraphViews {
    /// Build both views from `edges`.
    #[must_use]
    #[instrument(skip(edges), fields(edges = edges.len()))]
    pub fn from_edges(edges: &EdgeList) -> Self {
        let ids: BTreeSet<&NodeId> = edges
            .iter()
            .flat_map(|edge| [&edge.source, &edge.target])
            .collect();

        let mut directed = DiGraph::<NodeId, ()>::with_capacity(ids.len(), edges.len());
        let mut undirected = UnGraph::<NodeId, ()>::with_capacity(ids.len(), edges.len());
        let mut node_map: BTreeMap<NodeId, NodeIndex> = BTreeMap::new();

        for id in ids {
            let idx = directed.add_node(id.clone());
            let same = undirected.add_node(id.clone());
            debug_assert_eq!(idx, same);
            node_map.insert(id.clone(), idx);
        }

        let arcs: BTreeSet<(NodeIndex, NodeIndex)> = edges
            .iter()
            .filter_map(|edge| {
                Some((
                    *node_map.get(&edge.source)?,
                    *node_map.get(&edge.target)?,
                ))
            })
            .collect();

        let links: BTreeSet<(NodeIndex, NodeIndex)> =
            arcs.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect();

        for &(source, target) in &arcs {
            directed.add_edge(source, target, ());
        }
        for &(a, b) in &links {
            undirected.add_edge(a, b, ());
        }

        let content_hash = compute_arc_hash(&directed, &arcs);

        Self {
            directed,
            undirected,
            node_map,
            content_hash,
        }
    }

    /// Number of nodes (shared by both views).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.directed.node_count()
    }

    /// Number of distinct directed arcs.
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.directed.edge_count()
    }

    /// Look up the `NodeIndex` for an identifier.
    #[must_use]
    pub fn node_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Hash the arc set. `arcs` is already sorted because node indices follow
/// sorted identifier order.
fn compute_arc_hash(graph: &DiGraph<NodeId, ()>, arcs: &BTreeSet<(NodeIndex, NodeIndex)>) -> String {
    let mut hasher = blake3::Hasher::new();
    for &(source, target) in arcs {
        hasher.update(graph[source].as_str().as_bytes());
        hasher.update(b"\x00");
        hasher.update(graph[target].as_str().as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_edge_list_produces_empty_views() {
        let views = GraphViews::from_edges(&EdgeList::new());
        assert_eq!(views.node_count(), 0);
        assert_eq!(views.arc_count(), 0);
        assert_eq!(views.undirected.edge_count(), 0);
        assert!(views.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn duplicate_arcs_collapse() {
        let views = GraphViews::from_edges(&EdgeList::from_pairs([(0, 1), (0, 1), (1, 2)]));
        assert_eq!(views.node_count(), 3);
        assert_eq!(views.arc_count(), 2);
    }

    #[test]
    fn anti_parallel_arcs_are_one_undirected_edge() {
        let views = GraphViews::from_edges(&EdgeList::from_pairs([(0, 1), (1, 0)]));
        assert_eq!(views.arc_count(), 2);
        assert_eq!(views.undirected.edge_count(), 1);
    }

    #[test]
    fn self_loop_kept_in_both_views() {
        let views = GraphViews::from_edges(&EdgeList::from_pairs([(3, 3)]));
        assert_eq!(views.node_count(), 1);
        assert_eq!(views.arc_count(), 1);
        assert_eq!(views.undirected.edge_count(), 1);
    }

    #[test]
    fn arc_direction_preserved() {
        let views = GraphViews::from_edges(&EdgeList::from_pairs([("a", "b")]));
        let a = views.node_index(&NodeId::from("a")).unwrap();
        let b = views.node_index(&NodeId::from("b")).unwrap();
        assert!(views.directed.contains_edge(a, b));
        assert!(!views.directed.contains_edge(b, a));
    }

    #[test]
    fn content_hash_ignores_edge_order_and_duplicates() {
        let a = GraphViews::from_edges(&EdgeList::from_pairs([(0, 1), (1, 2)]));
        let b = GraphViews::from_edges(&EdgeList::from_pairs([(1, 2), (0, 1), (1, 2)]));
        let c = GraphViews::from_edges(&EdgeList::from_pairs([(1, 0), (1, 2)]));
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
    }
}
