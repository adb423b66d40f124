//! Hyperparameter grids, one per classifier family.
//!
//! A grid lists the values to try for each hyperparameter; the candidates
//! are the cartesian product, expanded in declaration order.

use serde::{Deserialize, Serialize};

use crate::model::{ForestParams, KnnParams, ModelSpec, SoftmaxParams};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestGrid {
    pub n_estimators: Vec<usize>,
    /// `0` means unbounded.
    pub max_depth: Vec<usize>,
    pub min_samples_split: Vec<usize>,
}

impl Default for ForestGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200],
            max_depth: vec![10, 20, 0],
            min_samples_split: vec![2, 5],
        }
    }
}

impl ForestGrid {
    #[must_use]
    pub fn candidates(&self) -> Vec<ModelSpec> {
        let mut out = Vec::new();
        for &n_estimators in &self.n_estimators {
            for &depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    out.push(ModelSpec::RandomForest(ForestParams {
                        n_estimators,
                        max_depth: (depth > 0).then_some(depth),
                        min_samples_split,
                    }));
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnGrid {
    pub k: Vec<usize>,
    pub distance_weighted: Vec<bool>,
}

impl Default for KnnGrid {
    fn default() -> Self {
        Self {
            k: vec![3, 5, 9],
            distance_weighted: vec![false, true],
        }
    }
}

impl KnnGrid {
    #[must_use]
    pub fn candidates(&self) -> Vec<ModelSpec> {
        let mut out = Vec::new();
        for &k in &self.k {
            for &distance_weighted in &self.distance_weighted {
                out.push(ModelSpec::Knn(KnnParams { k, distance_weighted }));
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftmaxGrid {
    pub learning_rate: Vec<f64>,
    pub epochs: Vec<usize>,
    pub l2: Vec<f64>,
}

impl Default for SoftmaxGrid {
    fn default() -> Self {
        Self {
            learning_rate: vec![0.1, 0.15],
            epochs: vec![200, 400],
            l2: vec![0.0, 0.001],
        }
    }
}

impl SoftmaxGrid {
    #[must_use]
    pub fn candidates(&self) -> Vec<ModelSpec> {
        let mut out = Vec::new();
        for &learning_rate in &self.learning_rate {
            for &epochs in &self.epochs {
                for &l2 in &self.l2 {
                    out.push(ModelSpec::Softmax(SoftmaxParams {
                        learning_rate,
                        epochs,
                        l2,
                    }));
                }
            }
        }
        out
    }
}
