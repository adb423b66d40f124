//! Classifier contract and model families.
//!
//! # Contract
//!
//! A fitted [`Classifier`] maps one standardized feature row (in the
//! extractor's schema order) to a probability per [`GraphLabel`]. The
//! probabilities are finite, non-negative and sum to 1. [`Classifier::predict`]
//! is the arg-max, with ties resolved toward the lower class id.
//!
//! # Families
//!
//! - [`forest::RandomForest`]: bagged CART trees with Gini splits.
//! - [`knn::KNearest`]: k-nearest neighbours, Euclidean distance.
//! - [`softmax::SoftmaxRegression`]: multinomial logistic regression.
//!
//! [`ModelSpec`] is an unfitted family + hyperparameter choice;
//! [`TrainedModel`] is the serializable fitted union.

pub mod forest;
pub mod knn;
pub mod softmax;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::label::GraphLabel;

pub use forest::{ForestParams, RandomForest};
pub use knn::{KNearest, KnnParams};
pub use softmax::{SoftmaxParams, SoftmaxRegression};

// ---------------------------------------------------------------------------
// Classifier trait
// ---------------------------------------------------------------------------

/// Fitted probabilistic classifier over standardized feature rows.
pub trait Classifier {
    /// Probability for each label, indexed by [`GraphLabel::index`].
    fn predict_proba(&self, row: &[f64]) -> [f64; GraphLabel::COUNT];

    /// Most probable label.
    fn predict(&self, row: &[f64]) -> GraphLabel {
        let probs = self.predict_proba(row);
        GraphLabel::from_index(argmax(&probs)).unwrap_or(GraphLabel::Tree)
    }
}

/// Index of the largest value; the first one wins ties.
#[must_use]
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Scale non-negative weights to sum to 1; all-zero weights become uniform.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalize_weights(weights: [f64; GraphLabel::COUNT]) -> [f64; GraphLabel::COUNT] {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return [1.0 / GraphLabel::COUNT as f64; GraphLabel::COUNT];
    }
    weights.map(|w| w / total)
}

// ---------------------------------------------------------------------------
// Fit errors
// ---------------------------------------------------------------------------

/// Why a model could not be fitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FitError {
    #[error("no training rows")]
    Empty,

    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("feature rows have inconsistent widths")]
    Ragged,

    #[error("invalid hyperparameter: {0}")]
    InvalidParams(String),
}

/// Shared input validation; returns the row width.
///
/// # Errors
///
/// Fails on empty input, a row/label count mismatch or ragged rows.
pub fn check_training_set(x: &[Vec<f64>], y: &[GraphLabel]) -> Result<usize, FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }
    let width = x.first().ok_or(FitError::Empty)?.len();
    if x.iter().any(|row| row.len() != width) {
        return Err(FitError::Ragged);
    }
    Ok(width)
}

// ---------------------------------------------------------------------------
// Families, specs and fitted models
// ---------------------------------------------------------------------------

/// Classifier family identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    RandomForest,
    Knn,
    Softmax,
}

impl ModelFamily {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::RandomForest => "Random Forest",
            Self::Knn => "K-Nearest Neighbors",
            Self::Softmax => "Softmax Regression",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One unfitted candidate: a family plus hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "params", rename_all = "snake_case")]
pub enum ModelSpec {
    RandomForest(ForestParams),
    Knn(KnnParams),
    Softmax(SoftmaxParams),
}

impl ModelSpec {
    #[must_use]
    pub const fn family(&self) -> ModelFamily {
        match self {
            Self::RandomForest(_) => ModelFamily::RandomForest,
            Self::Knn(_) => ModelFamily::Knn,
            Self::Softmax(_) => ModelFamily::Softmax,
        }
    }

    /// Fit this candidate on standardized rows.
    ///
    /// # Errors
    ///
    /// Returns a [`FitError`] for unusable input or hyperparameters.
    pub fn fit(&self, x: &[Vec<f64>], y: &[GraphLabel], seed: u64) -> Result<TrainedModel, FitError> {
        Ok(match self {
            Self::RandomForest(params) => TrainedModel::RandomForest(RandomForest::fit(params, x, y, seed)?),
            Self::Knn(params) => TrainedModel::Knn(KNearest::fit(params, x, y)?),
            Self::Softmax(params) => TrainedModel::Softmax(SoftmaxRegression::fit(params, x, y)?),
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RandomForest(p) => write!(
                f,
                "n_estimators={} max_depth={} min_samples_split={}",
                p.n_estimators,
                p.max_depth.map_or_else(|| "none".to_string(), |d| d.to_string()),
                p.min_samples_split
            ),
            Self::Knn(p) => write!(f, "k={} distance_weighted={}", p.k, p.distance_weighted),
            Self::Softmax(p) => write!(
                f,
                "learning_rate={} epochs={} l2={}",
                p.learning_rate, p.epochs, p.l2
            ),
        }
    }
}

/// A fitted model of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "model", rename_all = "snake_case")]
pub enum TrainedModel {
    RandomForest(RandomForest),
    Knn(KNearest),
    Softmax(SoftmaxRegression),
}

impl TrainedModel {
    #[must_use]
    pub const fn family(&self) -> ModelFamily {
        match self {
            Self::RandomForest(_) => ModelFamily::RandomForest,
            Self::Knn(_) => ModelFamily::Knn,
            Self::Softmax(_) => ModelFamily::Softmax,
        }
    }

    /// Number of features the model was fitted on.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::RandomForest(m) => m.width(),
            Self::Knn(m) => m.width(),
            Self::Softmax(m) => m.width(),
        }
    }

    /// Normalized impurity-based importances (random forests only).
    #[must_use]
    pub fn feature_importances(&self) -> Option<&[f64]> {
        match self {
            Self::RandomForest(m) => Some(m.feature_importances()),
            Self::Knn(_) | Self::Softmax(_) => None,
        }
    }
}

impl Classifier for TrainedModel {
    fn predict_proba(&self, row: &[f64]) -> [f64; GraphLabel::COUNT] {
        match self {
            Self::RandomForest(m) => m.predict_proba(row),
            Self::Knn(m) => m.predict_proba(row),
            Self::Softmax(m) => m.predict_proba(row),
        }
    }
}

/// Fraction of rows whose prediction matches the label.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(model: &impl Classifier, x: &[Vec<f64>], y: &[GraphLabel]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let hits = x
        .iter()
        .zip(y)
        .filter(|(row, label)| model.predict(row) == **label)
        .count();
    hits as f64 / x.len() as f64
}
