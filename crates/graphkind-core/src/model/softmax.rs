//! Multinomial logistic regression fitted by full-batch gradient descent.
//!
//! Weights start at zero, so fitting is deterministic without a seed. Each
//! epoch computes the mean cross-entropy gradient over all rows plus
//! `l2 · W` for the weights (biases are not penalized).

use serde::{Deserialize, Serialize};

use super::{Classifier, FitError, check_training_set};
use crate::label::GraphLabel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxParams {
    pub learning_rate: f64,
    pub epochs: usize,
    #[serde(default)]
    pub l2: f64,
}

impl Default for SoftmaxParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 300,
            l2: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    params: SoftmaxParams,
    /// One weight row per class.
    weights: Vec<Vec<f64>>,
    bias: [f64; GraphLabel::COUNT],
}

impl SoftmaxRegression {
    /// # Errors
    ///
    /// Fails on invalid input, a non-positive learning rate or a negative
    /// penalty.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(params: &SoftmaxParams, x: &[Vec<f64>], y: &[GraphLabel]) -> Result<Self, FitError> {
        let width = check_training_set(x, y)?;
        if !(params.learning_rate > 0.0 && params.learning_rate.is_finite()) {
            return Err(FitError::InvalidParams("learning_rate must be positive".into()));
        }
        if !(params.l2 >= 0.0 && params.l2.is_finite()) {
            return Err(FitError::InvalidParams("l2 must be non-negative".into()));
        }

        let mut model = Self {
            params: params.clone(),
            weights: vec![vec![0.0; width]; GraphLabel::COUNT],
            bias: [0.0; GraphLabel::COUNT],
        };
        let n = x.len() as f64;

        for _ in 0..params.epochs {
            let mut grad_w = vec![vec![0.0; width]; GraphLabel::COUNT];
            let mut grad_b = [0.0; GraphLabel::COUNT];

            for (row, label) in x.iter().zip(y) {
                let probs = model.predict_proba(row);
                for (class, p) in probs.iter().enumerate() {
                    let target = if class == label.index() { 1.0 } else { 0.0 };
                    let err = p - target;
                    grad_b[class] += err;
                    for (g, v) in grad_w[class].iter_mut().zip(row) {
                        *g += err * v;
                    }
                }
            }

            for class in 0..GraphLabel::COUNT {
                model.bias[class] -= params.learning_rate * grad_b[class] / n;
                for (w, g) in model.weights[class].iter_mut().zip(&grad_w[class]) {
                    *w -= params.learning_rate * (g / n + params.l2 * *w);
                }
            }
        }

        Ok(model)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub const fn params(&self) -> &SoftmaxParams {
        &self.params
    }

    fn logits(&self, row: &[f64]) -> [f64; GraphLabel::COUNT] {
        let mut out = self.bias;
        for (logit, weights) in out.iter_mut().zip(&self.weights) {
            *logit += weights.iter().zip(row).map(|(w, v)| w * v).sum::<f64>();
        }
        out
    }
}

impl Classifier for SoftmaxRegression {
    fn predict_proba(&self, row: &[f64]) -> [f64; GraphLabel::COUNT] {
        let logits = self.logits(row);
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp = logits.map(|z| (z - max).exp());
        super::normalize_weights(exp)
    }
}
