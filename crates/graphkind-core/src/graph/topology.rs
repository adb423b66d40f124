//! Acyclicity, topological generations and tree / forest membership.
//!
//! # Generations
//!
//! A topological generation is the set of nodes whose remaining in-degree
//! drops to zero at the same step of Kahn's algorithm. Generation 0 holds
//! every source; generation `k + 1` holds the nodes whose last predecessor
//! sits in generation `k`. Generations only exist for DAGs.
//!
//! # Trees and Forests
//!
//! Measured on the undirected view. A forest is an acyclic undirected graph,
//! which holds exactly when `edges == nodes - components`. A tree is a
//! forest with one component. A self-loop is an undirected cycle. Both are
//! undefined for the null graph.

use petgraph::{
    Direction,
    algo::{connected_components, toposort},
    graph::{DiGraph, NodeIndex, UnGraph},
    visit::EdgeRef,
};

use crate::edges::NodeId;

/// `true` when the directed graph has no cycle (self-loops are cycles).
#[must_use]
pub fn is_acyclic(graph: &DiGraph<NodeId, ()>) -> bool {
    toposort(graph, None).is_ok()
}

/// Topological generations of `graph`, or `None` if it contains a cycle.
///
/// Each generation lists node indices in ascending order.
#[must_use]
pub fn topological_generations(graph: &DiGraph<NodeId, ()>) -> Option<Vec<Vec<NodeIndex>>> {
    let mut indegree: Vec<usize> = graph
        .node_indices()
        .map(|idx| graph.edges_directed(idx, Direction::Incoming).count())
        .collect();

    let mut ready: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|idx| indegree[idx.index()] == 0)
        .collect();

    let mut generations: Vec<Vec<NodeIndex>> = Vec::new();
    let mut placed = 0usize;

    while !ready.is_empty() {
        let current = std::mem::take(&mut ready);
        for &idx in &current {
            for edge in graph.edges_directed(idx, Direction::Outgoing) {
                let slot = &mut indegree[edge.target().index()];
                *slot -= 1;
                if *slot == 0 {
                    ready.push(edge.target());
                }
            }
        }
        ready.sort_unstable();
        placed += current.len();
        generations.push(current);
    }

    // Nodes left with positive in-degree sit on or behind a cycle.
    (placed == graph.node_count()).then_some(generations)
}

/// Number of generations and the size of the largest one.
///
/// `None` when the graph is cyclic or has no nodes.
#[must_use]
pub fn generation_profile(graph: &DiGraph<NodeId, ()>) -> Option<(usize, usize)> {
    let generations = topological_generations(graph)?;
    let widest = generations.iter().map(Vec::len).max()?;
    Some((generations.len(), widest))
}

/// `true` when the undirected graph is acyclic; `None` for the null graph.
#[must_use]
pub fn is_forest(graph: &UnGraph<NodeId, ()>) -> Option<bool> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }
    let components = connected_components(graph);
    Some(graph.edge_count() + components == n)
}

/// `true` when the undirected graph is connected and acyclic; `None` for
/// the null graph.
#[must_use]
pub fn is_tree(graph: &UnGraph<NodeId, ()>) -> Option<bool> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }
    Some(graph.edge_count() + 1 == n && connected_components(graph) == 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
