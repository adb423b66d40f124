#![forbid(unsafe_code)]
//! graphkind-core library.
//!
//! Turns edge lists into fixed-order structural feature vectors and
//! classifies them as Tree, Cyclic or DAG.
//!
//! ```text
//! raw edges ─► edges ─► graph ─► features ─► normalize ─► model ─► label
//! ```
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums in library modules, each mapping to
//!   an [`error::ErrorCode`]; `anyhow::Result` for configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod edges;
pub mod error;
pub mod features;
pub mod graph;
pub mod label;
pub mod model;
pub mod normalize;
pub mod service;
pub mod train;

pub use edges::{Edge, EdgeInput, EdgeList, NodeId, parse_edge_list};
pub use error::ErrorCode;
pub use features::{Feature, FeatureMap, FeatureSchema, GraphFeatureExtractor, GraphFeatures};
pub use label::GraphLabel;
pub use service::{ClassificationService, ClassifyRequest, ClassifyResponse, ErrorResponse};
