//! Inference over a loaded classifier/extractor pair.
//!
//! # Request flow
//!
//! 1. Validate the edge list: it must be a non-empty array whose elements
//!    are `[source, target]` pairs of strings or numbers. Nothing else is
//!    computed for a request that fails here.
//! 2. Snapshot the current [`ModelBundle`].
//! 3. Extract raw features in the bundle's schema order, standardize them
//!    with the bundle's fitted normalizer, and ask the classifier for class
//!    probabilities.
//! 4. Answer with the arg-max class id, its probability as confidence, and
//!    the raw features keyed by name.
//!
//! # Reloading
//!
//! The bundle sits behind a `parking_lot::RwLock<Option<Arc<_>>>`. A request
//! holds the read lock only long enough to clone the `Arc`; [`reload`]
//! loads and verifies a new pair first, then swaps it in under the write
//! lock. In-flight requests finish on the bundle they started with.
//!
//! [`reload`]: ClassificationService::reload

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::artifact::{ArtifactError, ArtifactStore, ModelBundle};
use crate::edges::{EdgeFormatError, EdgeList, parse_structured};
use crate::error::ErrorCode;
use crate::features::FeatureMap;
use crate::label::GraphLabel;
use crate::model::{Classifier, argmax};
use crate::normalize::{NormalizerError, sanitize};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `{ "edges": [[source, target], ...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub edges: Value,
}

impl ClassifyRequest {
    pub fn new(edges: impl Into<Value>) -> Self {
        Self {
            edges: edges.into(),
        }
    }
}

/// Successful classification.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResponse {
    /// Class id (0 = Tree, 1 = Cyclic, 2 = DAG).
    pub prediction: u8,
    /// Probability of the predicted class.
    pub confidence: f64,
    /// Raw feature values in schema order.
    pub features: FeatureMap,
}

impl ClassifyResponse {
    #[must_use]
    pub fn label(&self) -> Option<GraphLabel> {
        GraphLabel::try_from(self.prediction).ok()
    }
}

/// Structured error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("no edges provided")]
    EmptyEdges,

    #[error("invalid edge format: {0}")]
    InvalidEdge(#[from] EdgeFormatError),

    #[error("no model is loaded")]
    NotReady,

    #[error("feature extractor has not been fitted")]
    NotFitted,

    #[error("classification failed: {0}")]
    Prediction(String),
}

impl ClassifyError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyEdges => ErrorCode::EmptyEdgeList,
            Self::InvalidEdge(err) => err.code(),
            Self::NotReady => ErrorCode::ModelNotFound,
            Self::NotFitted => ErrorCode::NotFitted,
            Self::Prediction(_) => ErrorCode::InternalUnexpected,
        }
    }

    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        let code = self.code();
        ErrorResponse {
            error: self.to_string(),
            code: code.code(),
            status: code.http_status(),
            hint: code.hint(),
        }
    }
}

impl From<NormalizerError> for ClassifyError {
    fn from(err: NormalizerError) -> Self {
        match err {
            NormalizerError::NotFitted => Self::NotFitted,
            other => Self::Prediction(other.to_string()),
        }
    }
}

/// Check request shape and convert it to an [`EdgeList`].
///
/// Endpoints are coerced to node identifiers; anything that is not a
/// non-empty array of two-element pairs is rejected.
///
/// # Errors
///
/// [`ClassifyError::EmptyEdges`] for a missing, null or empty list,
/// [`ClassifyError::InvalidEdge`] for anything malformed.
pub fn validate_edges(edges: &Value) -> Result<EdgeList, ClassifyError> {
    match edges {
        Value::Null => Err(ClassifyError::EmptyEdges),
        Value::Array(items) if items.is_empty() => Err(ClassifyError::EmptyEdges),
        Value::Array(items) => Ok(parse_structured(items)?),
        _ => Err(ClassifyError::InvalidEdge(EdgeFormatError::Literal(
            "edges must be an array of [source, target] pairs".into(),
        ))),
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Thread-safe classifier front end.
#[derive(Debug, Default)]
pub struct ClassificationService {
    bundle: RwLock<Option<Arc<ModelBundle>>>,
}

impl ClassificationService {
    /// A service with no model; requests fail with [`ClassifyError::NotReady`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bundle(bundle: ModelBundle) -> Self {
        Self {
            bundle: RwLock::new(Some(Arc::new(bundle))),
        }
    }

    /// Load the pair stored in `store`.
    ///
    /// # Errors
    ///
    /// Any [`ArtifactError`] from loading or verification.
    pub fn from_store(store: &ArtifactStore) -> Result<Self, ArtifactError> {
        Ok(Self::with_bundle(store.load()?))
    }

    /// Load a fresh pair and swap it in. On failure the current bundle
    /// stays active.
    ///
    /// # Errors
    ///
    /// Any [`ArtifactError`] from loading or verification.
    #[instrument(skip_all, fields(dir = %store.dir().display()))]
    pub fn reload(&self, store: &ArtifactStore) -> Result<(), ArtifactError> {
        let bundle = store.load()?;
        info!(family = %bundle.family(), digest = %bundle.extractor_digest, "reloaded model");
        self.swap(bundle);
        Ok(())
    }

    /// Replace the active bundle, returning the previous one.
    pub fn swap(&self, bundle: ModelBundle) -> Option<Arc<ModelBundle>> {
        self.bundle.write().replace(Arc::new(bundle))
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.bundle.read().is_some()
    }

    /// The active bundle, if any.
    #[must_use]
    pub fn bundle(&self) -> Option<Arc<ModelBundle>> {
        self.bundle.read().clone()
    }

    /// Validate and classify a request.
    ///
    /// # Errors
    ///
    /// See [`ClassifyError`].
    pub fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, ClassifyError> {
        let edges = validate_edges(&request.edges)?;
        self.classify_edges(&edges)
    }

    /// Classify an already validated edge list.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::EmptyEdges`] for an empty list, otherwise state or
    /// prediction errors.
    #[instrument(skip_all, fields(edges = edges.len()))]
    pub fn classify_edges(&self, edges: &EdgeList) -> Result<ClassifyResponse, ClassifyError> {
        if edges.is_empty() {
            return Err(ClassifyError::EmptyEdges);
        }
        let bundle = self.bundle().ok_or(ClassifyError::NotReady)?;
        let extractor = &bundle.extractor;

        let raw: Vec<f64> = extractor
            .extract_features(edges)
            .into_iter()
            .map(sanitize)
            .collect();
        let standardized = extractor.standardize(&raw)?;

        let probs = bundle.model.predict_proba(&standardized);
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(ClassifyError::Prediction(
                "classifier produced non-finite probabilities".into(),
            ));
        }
        let best = argmax(&probs);
        let label = GraphLabel::from_index(best)
            .ok_or_else(|| ClassifyError::Prediction(format!("class index {best} out of range")))?;

        debug!(%label, confidence = probs[best], "classified graph");
        Ok(ClassifyResponse {
            prediction: label.id(),
            confidence: probs[best],
            features: FeatureMap::from_values(Some(extractor.schema()), &raw),
        })
    }

    /// Decode a JSON request body and classify it, mapping every failure to
    /// an [`ErrorResponse`].
    ///
    /// # Errors
    ///
    /// The error object for any rejected or failed request.
    pub fn handle_json(&self, body: &str) -> Result<ClassifyResponse, ErrorResponse> {
        let request: ClassifyRequest = serde_json::from_str(body).map_err(|err| {
            ClassifyError::InvalidEdge(EdgeFormatError::Literal(err.to_string())).to_response()
        })?;
        self.classify(&request).map_err(|err| err.to_response())
    }
}
