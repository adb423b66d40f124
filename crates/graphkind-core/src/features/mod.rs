//! Fixed-order structural feature vectors.
//!
//! [`FeatureSchema`] names the features and their order,
//! [`GraphFeatures`] holds one graph's raw values, and
//! [`GraphFeatureExtractor`] binds a schema to the normalization learned at
//! training time.

pub mod extract;
pub mod schema;

pub use extract::{FeatureMap, GraphFeatureExtractor, GraphFeatures};
pub use schema::{Feature, FeatureSchema, SchemaError};
