//! Model selection over the configured classifier families.
//!
//! # Search
//!
//! For every enabled family, each grid candidate is scored by stratified
//! k-fold cross-validated accuracy on the standardized training rows. The
//! family's best candidate (first wins ties) is refitted on all training
//! rows and, when validation rows are given, scored on them too. The
//! selected model is the family winner with the highest cross-validated
//! score.
//!
//! A candidate that fails to fit is skipped with a warning; a family with no
//! surviving candidate is skipped likewise. If nothing survives the search
//! fails with [`TrainError::NoModelTrained`].
//!
//! [`pipeline::run_training`] wraps this with dataset splitting, feature
//! extraction and the final evaluation report.

pub mod grid;
pub mod pipeline;
pub mod report;
pub mod split;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::TrainingConfig;
use crate::error::ErrorCode;
use crate::label::GraphLabel;
use crate::model::{Classifier, FitError, ModelFamily, ModelSpec, TrainedModel, accuracy};
use crate::normalize::NormalizerError;

pub use pipeline::{TrainingRun, run_training};
pub use report::{ClassMetrics, ClassificationReport, FeatureImportance, top_features};

/// Why training could not produce a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrainError {
    #[error("insufficient training data: {0}")]
    InsufficientData(String),

    #[error("no models were successfully trained")]
    NoModelTrained,

    #[error(transparent)]
    Normalizer(#[from] NormalizerError),
}

impl TrainError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InsufficientData(_) => ErrorCode::InsufficientData,
            Self::NoModelTrained => ErrorCode::NoModelTrained,
            Self::Normalizer(err) => err.code(),
        }
    }
}

/// One family's winning candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyResult {
    pub spec: ModelSpec,
    pub cv_score: f64,
    pub model: TrainedModel,
    pub validation: Option<ClassificationReport>,
}

impl FamilyResult {
    #[must_use]
    pub const fn family(&self) -> ModelFamily {
        self.spec.family()
    }

    #[must_use]
    pub fn validation_score(&self) -> Option<f64> {
        self.validation.as_ref().map(|r| r.accuracy)
    }

    #[must_use]
    pub fn summary(&self) -> FamilySummary {
        FamilySummary {
            family: self.family(),
            params: self.spec.to_string(),
            cv_score: self.cv_score,
            validation_score: self.validation_score(),
        }
    }
}

/// Serializable digest of a [`FamilyResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilySummary {
    pub family: ModelFamily,
    pub params: String,
    pub cv_score: f64,
    pub validation_score: Option<f64>,
}

/// Every family winner plus the overall selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    results: Vec<FamilyResult>,
    best: usize,
}

impl TrainingOutcome {
    #[must_use]
    pub fn results(&self) -> &[FamilyResult] {
        &self.results
    }

    #[must_use]
    pub fn best(&self) -> &FamilyResult {
        &self.results[self.best]
    }

    #[must_use]
    pub fn into_best(mut self) -> FamilyResult {
        self.results.swap_remove(self.best)
    }
}

/// Grid search with cross-validation over standardized rows.
#[derive(Debug, Clone, Default)]
pub struct ClassifierTrainer {
    config: TrainingConfig,
}

impl ClassifierTrainer {
    #[must_use]
    pub const fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Search every enabled family and select the best model.
    ///
    /// # Errors
    ///
    /// [`TrainError::InsufficientData`] when there are fewer rows than
    /// folds, [`TrainError::NoModelTrained`] when no candidate fits.
    #[instrument(skip_all, fields(rows = x.len(), families = self.config.families.len()))]
    pub fn fit(
        &self,
        x: &[Vec<f64>],
        y: &[GraphLabel],
        validation: Option<(&[Vec<f64>], &[GraphLabel])>,
    ) -> Result<TrainingOutcome, TrainError> {
        if x.len() != y.len() {
            return Err(TrainError::InsufficientData(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        let folds = split::stratified_k_folds(y, self.config.cv_folds, self.config.seed)?;

        let mut results: Vec<FamilyResult> = Vec::new();
        for &family in &self.config.families {
            match self.search_family(family, x, y, &folds, validation) {
                Ok(Some(result)) => results.push(result),
                Ok(None) => warn!(%family, "no candidate could be fitted; skipping family"),
                Err(err) => warn!(%family, error = %err, "refit of best candidate failed; skipping family"),
            }
        }

        let mut best: Option<usize> = None;
        for (i, result) in results.iter().enumerate() {
            if best.is_none_or(|b| result.cv_score > results[b].cv_score) {
                best = Some(i);
            }
        }
        let best = best.ok_or(TrainError::NoModelTrained)?;
        info!(
            family = %results[best].family(),
            cv_score = results[best].cv_score,
            "selected best model"
        );
        Ok(TrainingOutcome { results, best })
    }

    fn search_family(
        &self,
        family: ModelFamily,
        x: &[Vec<f64>],
        y: &[GraphLabel],
        folds: &[Vec<usize>],
        validation: Option<(&[Vec<f64>], &[GraphLabel])>,
    ) -> Result<Option<FamilyResult>, FitError> {
        let candidates = self.config.candidates(family);
        info!(%family, candidates = candidates.len(), "training family");

        let mut best: Option<(ModelSpec, f64)> = None;
        for spec in candidates {
            match self.cross_validate(&spec, x, y, folds) {
                Ok(score) => {
                    if best.as_ref().is_none_or(|(_, s)| score > *s) {
                        best = Some((spec, score));
                    }
                }
                Err(err) => warn!(%family, params = %spec, error = %err, "candidate failed to fit"),
            }
        }
        let Some((spec, cv_score)) = best else {
            return Ok(None);
        };
        info!(%family, cv_score, params = %spec, "best cross-validated candidate");

        let model = spec.fit(x, y, self.config.seed)?;
        let validation = validation.map(|(vx, vy)| {
            let predicted: Vec<GraphLabel> = vx.iter().map(|row| model.predict(row)).collect();
            let report = ClassificationReport::from_predictions(vy, &predicted);
            info!(%family, validation_score = report.accuracy, "validation score");
            report
        });

        Ok(Some(FamilyResult {
            spec,
            cv_score,
            model,
            validation,
        }))
    }

    #[allow(clippy::cast_precision_loss)]
    fn cross_validate(
        &self,
        spec: &ModelSpec,
        x: &[Vec<f64>],
        y: &[GraphLabel],
        folds: &[Vec<usize>],
    ) -> Result<f64, FitError> {
        let mut total = 0.0;
        for (i, held_out) in folds.iter().enumerate() {
            let fit_rows: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .flat_map(|(_, fold)| fold.iter().copied())
                .collect();
            let model = spec.fit(
                &split::gather(x, &fit_rows),
                &split::gather(y, &fit_rows),
                self.config.seed,
            )?;
            total += accuracy(&model, &split::gather(x, held_out), &split::gather(y, held_out));
        }
        Ok(total / folds.len() as f64)
    }
}
