//! Weak and strong connectivity.
//!
//! Both measurements are undefined for the null graph (no nodes); the
//! functions return `None` there and the caller reports zeros.

use petgraph::{
    algo::{connected_components, tarjan_scc},
    graph::DiGraph,
};

use crate::edges::NodeId;

/// Component count plus whether the graph is a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSummary {
    pub count: usize,
    pub connected: bool,
}

impl ComponentSummary {
    const fn from_count(count: usize) -> Self {
        Self {
            count,
            connected: count == 1,
        }
    }
}

/// Weakly connected components (edge direction ignored).
#[must_use]
pub fn weak_components(graph: &DiGraph<NodeId, ()>) -> Option<ComponentSummary> {
    if graph.node_count() == 0 {
        return None;
    }
    Some(ComponentSummary::from_count(connected_components(graph)))
}

/// Strongly connected components (edge direction respected). O(V + E).
#[must_use]
pub fn strong_components(graph: &DiGraph<NodeId, ()>) -> Option<ComponentSummary> {
    if graph.node_count() == 0 {
        return None;
    }
    Some(ComponentSummary::from_count(tarjan_scc(graph).len()))
}
