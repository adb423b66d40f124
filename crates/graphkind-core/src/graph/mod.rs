//! Graph views and structural metrics.
//!
//! # Overview
//!
//! This module turns a canonical [`EdgeList`](crate::edges::EdgeList) into
//! petgraph views and computes the raw structural measurements that the
//! feature extractor reports.
//!
//! ## Pipeline
//!
//! ```text
//! EdgeList
//!        ↓  build::GraphViews::from_edges()
//! GraphViews
//!   ├─ directed:   one arc per distinct (source, target)
//!   └─ undirected: one edge per distinct {source, target}
//!        ↓
//! stats         density, degree summaries, self-loops, reciprocity
//! connectivity  weak / strong components
//! topology      acyclicity, topological generations, tree / forest
//! clustering    average local clustering coefficient
//! ```
//!
//! Metrics that are undefined on degenerate graphs (for example connectivity
//! of the null graph) return `Option`; the caller picks the fallback value.
//!
//! ## Node Order
//!
//! Nodes are inserted in sorted identifier order, so node indices (and any
//! metric that iterates them) do not depend on edge order.

pub mod build;
pub mod clustering;
pub mod connectivity;
pub mod stats;
pub mod topology;

pub use build::GraphViews;
pub use connectivity::ComponentSummary;
pub use stats::DegreeSummary;
