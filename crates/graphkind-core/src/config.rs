use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;
use crate::model::{ModelFamily, ModelSpec};
use crate::train::grid::{ForestGrid, KnnGrid, SoftmaxGrid};

/// Conventional config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "graphkind.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphkindConfig {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,
    #[serde(default = "default_validation_fraction")]
    pub validation_fraction: f64,
    #[serde(default = "default_families")]
    pub families: Vec<ModelFamily>,
    #[serde(default)]
    pub random_forest: ForestGrid,
    #[serde(default)]
    pub knn: KnnGrid,
    #[serde(default)]
    pub softmax: SoftmaxGrid,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            cv_folds: default_cv_folds(),
            validation_fraction: default_validation_fraction(),
            families: default_families(),
            random_forest: ForestGrid::default(),
            knn: KnnGrid::default(),
            softmax: SoftmaxGrid::default(),
        }
    }
}

impl TrainingConfig {
    /// Grid candidates for one family.
    #[must_use]
    pub fn candidates(&self, family: ModelFamily) -> Vec<ModelSpec> {
        match family {
            ModelFamily::RandomForest => self.random_forest.candidates(),
            ModelFamily::Knn => self.knn.candidates(),
            ModelFamily::Softmax => self.softmax.candidates(),
        }
    }
}

/// Load `path`, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<GraphkindConfig> {
    if !path.exists() {
        return Ok(GraphkindConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<GraphkindConfig>(&content).with_context(|| {
        format!(
            "{}: failed to parse {}",
            ErrorCode::ConfigParseError.code(),
            path.display()
        )
    })
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

const fn default_seed() -> u64 {
    42
}

const fn default_cv_folds() -> usize {
    3
}

const fn default_validation_fraction() -> f64 {
    0.2
}

fn default_families() -> Vec<ModelFamily> {
    vec![ModelFamily::RandomForest, ModelFamily::Knn, ModelFamily::Softmax]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = load_config(&dir.path().join(CONFIG_FILE)).expect("load should succeed");
        assert_eq!(cfg.artifacts.dir, PathBuf::from("artifacts"));
        assert_eq!(cfg.training.seed, 42);
        assert_eq!(cfg.training.cv_folds, 3);
        assert_eq!(cfg.training.families.len(), 3);
        assert_eq!(cfg.training.random_forest.max_depth, vec![10, 20, 0]);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
[artifacts]
dir = "models"

[training]
seed = 7
families = ["knn"]

[training.knn]
k = [1]
"#,
        )
        .expect("write config");

        let cfg = load_config(&path).expect("load should succeed");
        assert_eq!(cfg.artifacts.dir, PathBuf::from("models"));
        assert_eq!(cfg.training.seed, 7);
        assert_eq!(cfg.training.families, vec![ModelFamily::Knn]);
        assert_eq!(cfg.training.knn.k, vec![1]);
        assert_eq!(cfg.training.knn.distance_weighted, vec![false, true]);
        assert!((cfg.training.validation_fraction - 0.2).abs() < f64::EPSILON);
        assert_eq!(cfg.training.candidates(ModelFamily::Knn).len(), 2);
    }

    #[test]
    fn malformed_config_names_the_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[training\nseed = ").expect("write config");

        let err = load_config(&path).expect_err("parse should fail");
        let message = format!("{err:#}");
        assert!(message.contains("E1005"));
        assert!(message.contains(CONFIG_FILE));
    }

    #[test]
    fn unknown_family_is_rejected() {
        let parsed = toml::from_str::<GraphkindConfig>("[training]\nfamilies = [\"svm\"]\n");
        assert!(parsed.is_err());
    }
}
