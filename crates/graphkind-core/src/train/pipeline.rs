//! End-to-end training: datasets in, fitted extractor and model out.
//!
//! Without a validation table, a label-stratified hold-out is carved from
//! the training table before anything is fitted, so the normalizer only
//! ever sees training rows.

use tracing::{info, instrument};

use super::report::{ClassificationReport, FeatureImportance, top_features};
use super::{ClassifierTrainer, FamilySummary, TrainError, split};
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::features::GraphFeatureExtractor;
use crate::model::{ModelSpec, TrainedModel};

/// How many features the importance summary keeps.
pub const TOP_FEATURES: usize = 10;

/// Everything produced by one training run.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    /// Fitted extractor (schema plus normalization) to persist with `model`.
    pub extractor: GraphFeatureExtractor,
    pub model: TrainedModel,
    pub spec: ModelSpec,
    pub cv_score: f64,
    pub families: Vec<FamilySummary>,
    /// Evaluation of `model` on the validation rows.
    pub report: ClassificationReport,
    /// Empty unless the selected model is a random forest.
    pub top_features: Vec<FeatureImportance>,
    pub train_rows: usize,
    pub validation_rows: usize,
}

/// Split, extract, standardize, search and evaluate.
///
/// # Errors
///
/// Fails when the data cannot be split or fitted, or when no candidate
/// model trains.
#[instrument(skip_all, fields(train = train.len(), validation = validation.map(Dataset::len)))]
pub fn run_training(
    train: &Dataset,
    validation: Option<&Dataset>,
    config: &TrainingConfig,
) -> Result<TrainingRun, TrainError> {
    let (train, validation) = match validation {
        Some(v) => (train.clone(), v.clone()),
        None => {
            let (fit_rows, holdout_rows) =
                split::stratified_split(train.labels(), config.validation_fraction, config.seed)?;
            (train.subset(&fit_rows), train.subset(&holdout_rows))
        }
    };
    info!(
        train_rows = train.len(),
        validation_rows = validation.len(),
        "prepared training data"
    );

    let mut extractor = GraphFeatureExtractor::new();
    let x_train = extractor.fit_transform(train.edges())?;
    let x_val = extractor.transform(validation.edges())?;

    let outcome = ClassifierTrainer::new(config.clone()).fit(
        &x_train,
        train.labels(),
        Some((x_val.as_slice(), validation.labels())),
    )?;
    let families = outcome.results().iter().map(super::FamilyResult::summary).collect();
    let best = outcome.into_best();

    let report = best.validation.clone().unwrap_or_else(|| {
        ClassificationReport::from_predictions(validation.labels(), &[])
    });
    let top_features = best
        .model
        .feature_importances()
        .map(|imp| top_features(extractor.schema(), imp, TOP_FEATURES))
        .unwrap_or_default();

    Ok(TrainingRun {
        extractor,
        model: best.model,
        spec: best.spec,
        cv_score: best.cv_score,
        families,
        report,
        top_features,
        train_rows: train.len(),
        validation_rows: validation.len(),
    })
}
