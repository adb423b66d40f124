//! Size, degree and arc statistics over the directed view.
//!
//! # Statistics Provided
//!
//! - **density**: `arcs / (nodes * (nodes - 1))`. Zero for graphs with 0 or
//!   1 node. Self-loops count as arcs, so a one-node graph with a self-loop
//!   would divide by zero; the node-count guard covers it.
//! - **degree summaries**: mean, maximum and population standard deviation
//!   of the in-degree and out-degree distributions. A self-loop adds one to
//!   both the in- and out-degree of its node.
//! - **self-loops**: whether any arc starts and ends at the same node.
//! - **reciprocity**: fraction of arcs `u → v` (with `u != v`) whose reverse
//!   `v → u` is also present. Self-loops count in the denominator but are
//!   never reciprocated.

use petgraph::{Direction, graph::DiGraph, visit::EdgeRef};

use crate::edges::NodeId;

/// Mean / max / population-std of one degree distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DegreeSummary {
    pub mean: f64,
    pub max: f64,
    pub std: f64,
}

impl DegreeSummary {
    /// Summarize `values`.
    ///
    /// All zero for an empty slice; `std` is zero for fewer than two values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[usize]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<usize>() as f64 / n;
        let max = values.iter().copied().max().unwrap_or(0) as f64;
        let std = if values.len() < 2 {
            0.0
        } else {
            let variance = values
                .iter()
                .map(|&v| {
                    let d = v as f64 - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            variance.sqrt()
        };
        Self { mean, max, std }
    }
}

/// Directed density; zero for fewer than two nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(graph: &DiGraph<NodeId, ()>) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    graph.edge_count() as f64 / (n * (n - 1)) as f64
}

/// In-degree and out-degree summaries, in that order.
#[must_use]
pub fn degree_summaries(graph: &DiGraph<NodeId, ()>) -> (DegreeSummary, DegreeSummary) {
    let degrees = |direction: Direction| -> Vec<usize> {
        graph
            .node_indices()
            .map(|idx| graph.edges_directed(idx, direction).count())
            .collect()
    };
    (
        DegreeSummary::from_values(&degrees(Direction::Incoming)),
        DegreeSummary::from_values(&degrees(Direction::Outgoing)),
    )
}

/// Whether any arc is a self-loop.
#[must_use]
pub fn has_self_loops(graph: &DiGraph<NodeId, ()>) -> bool {
    graph.edge_references().any(|e| e.source() == e.target())
}

/// Overall reciprocity, or `None` when the graph has no arcs.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reciprocity(graph: &DiGraph<NodeId, ()>) -> Option<f64> {
    let arcs = graph.edge_count();
    if arcs == 0 {
        return None;
    }
    let reciprocated = graph
        .edge_references()
        .filter(|e| e.source() != e.target() && graph.contains_edge(e.target(), e.source()))
        .count();
    Some(reciprocated as f64 / arcs as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
