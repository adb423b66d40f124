//! `gk train`: fit, report and save a classifier/extractor pair.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use graphkind_core::artifact::{ArtifactStore, DEFAULT_LOCK_TIMEOUT};
use graphkind_core::config::{CONFIG_FILE, load_config};
use graphkind_core::dataset::Dataset;
use graphkind_core::model::ModelFamily;
use graphkind_core::train::{ClassificationReport, FamilySummary, FeatureImportance, run_training};
use serde::Serialize;
use tracing::info;

use super::coded;
use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training table: CSV with `edgelist` and `label` columns.
    #[arg(long)]
    pub train: PathBuf,

    /// Separate validation table. Without it a stratified split is held out.
    #[arg(long)]
    pub validation: Option<PathBuf>,

    /// Artifact directory (defaults to `artifacts.dir` from the config).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Configuration file. A missing file means defaults.
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,
}

/// Result payload for `gk train`.
#[derive(Debug, Serialize)]
pub struct TrainSummary {
    pub artifacts: PathBuf,
    pub family: ModelFamily,
    pub params: String,
    pub cv_score: f64,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub report: ClassificationReport,
    pub families: Vec<FamilySummary>,
    pub top_features: Vec<FeatureImportance>,
}

fn load_table(path: &Path) -> Result<Dataset> {
    Dataset::load_csv(path).map_err(|err| coded(err.code(), err))
}

/// Execute `gk train`.
///
/// # Errors
///
/// Fails on an unreadable config or table, when no model trains, or when
/// the artifacts cannot be written.
pub fn run_train(args: &TrainArgs, output: OutputMode) -> Result<()> {
    let config = load_config(&args.config)?;
    let out_dir = args.out.clone().unwrap_or_else(|| config.artifacts.dir.clone());

    let train = load_table(&args.train)?;
    let validation = args.validation.as_deref().map(load_table).transpose()?;

    let store = ArtifactStore::new(&out_dir);
    let lock = store
        .lock(DEFAULT_LOCK_TIMEOUT)
        .map_err(|err| coded(err.code(), err))?;

    let run = run_training(&train, validation.as_ref(), &config.training)
        .map_err(|err| coded(err.code(), err))?;
    store
        .save(&lock, &run.extractor, &run.model)
        .map_err(|err| coded(err.code(), err))?;
    lock.release();
    info!(dir = %out_dir.display(), family = %run.spec.family(), "training complete");

    let summary = TrainSummary {
        artifacts: out_dir,
        family: run.spec.family(),
        params: run.spec.to_string(),
        cv_score: run.cv_score,
        train_rows: run.train_rows,
        validation_rows: run.validation_rows,
        report: run.report,
        families: run.families,
        top_features: run.top_features,
    };

    render(output, &summary, render_human)
}

fn render_human(s: &TrainSummary, w: &mut dyn Write) -> std::io::Result<()> {
    section(w, "Best model")?;
    kv(w, "family", s.family.to_string())?;
    kv(w, "params", &s.params)?;
    kv(w, "cv accuracy", format!("{:.4}", s.cv_score))?;
    kv(w, "rows", format!("{} train / {} validation", s.train_rows, s.validation_rows))?;
    kv(w, "saved to", s.artifacts.display().to_string())?;
    writeln!(w)?;

    section(w, "Families")?;
    for family in &s.families {
        let validation = family
            .validation_score
            .map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
        writeln!(
            w,
            "{:<14} cv={:.4} validation={validation}  {}",
            family.family.to_string(),
            family.cv_score,
            family.params
        )?;
    }
    writeln!(w)?;

    section(w, "Validation report")?;
    write!(w, "{}", s.report)?;

    if !s.top_features.is_empty() {
        writeln!(w)?;
        section(w, "Top features")?;
        for item in &s.top_features {
            writeln!(w, "{:<34} {:.4}", item.feature, item.importance)?;
        }
    }
    Ok(())
}
