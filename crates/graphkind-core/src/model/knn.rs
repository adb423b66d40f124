//! k-nearest neighbours over standardized rows.
//!
//! Fitting stores the training set. A query takes the `k` closest rows by
//! Euclidean distance (ties broken by training order) and votes. With
//! distance weighting each vote counts `1 / d`; if any neighbour sits at
//! distance zero, only the exact matches vote.

use serde::{Deserialize, Serialize};

use super::{Classifier, FitError, check_training_set, normalize_weights};
use crate::label::GraphLabel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnnParams {
    pub k: usize,
    #[serde(default)]
    pub distance_weighted: bool,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            k: 5,
            distance_weighted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNearest {
    params: KnnParams,
    rows: Vec<Vec<f64>>,
    labels: Vec<GraphLabel>,
}

impl KNearest {
    /// Memorize the training set.
    ///
    /// # Errors
    ///
    /// Fails on invalid input or `k == 0`.
    pub fn fit(params: &KnnParams, x: &[Vec<f64>], y: &[GraphLabel]) -> Result<Self, FitError> {
        check_training_set(x, y)?;
        if params.k == 0 {
            return Err(FitError::InvalidParams("k must be at least 1".into()));
        }
        Ok(Self {
            params: params.clone(),
            rows: x.to_vec(),
            labels: y.to_vec(),
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub const fn params(&self) -> &KnnParams {
        &self.params
    }

    fn neighbours(&self, row: &[f64]) -> Vec<(f64, GraphLabel)> {
        let mut scored: Vec<(usize, f64)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, train)| (i, euclidean(train, row)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(self.params.k)
            .map(|(i, d)| (d, self.labels[i]))
            .collect()
    }
}

impl Classifier for KNearest {
    fn predict_proba(&self, row: &[f64]) -> [f64; GraphLabel::COUNT] {
        let neighbours = self.neighbours(row);
        let mut votes = [0.0; GraphLabel::COUNT];

        if self.params.distance_weighted {
            let exact: Vec<_> = neighbours.iter().filter(|(d, _)| *d <= 0.0).collect();
            if exact.is_empty() {
                for (d, label) in &neighbours {
                    votes[label.index()] += 1.0 / d;
                }
            } else {
                for (_, label) in exact {
                    votes[label.index()] += 1.0;
                }
            }
        } else {
            for (_, label) in &neighbours {
                votes[label.index()] += 1.0;
            }
        }
        normalize_weights(votes)
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training() -> (Vec<Vec<f64>>, Vec<GraphLabel>) {
        (
            vec![
                vec![0.0, 0.0],
                vec![0.1, 0.0],
                vec![5.0, 5.0],
                vec![5.1, 5.0],
                vec![5.0, 5.2],
            ],
            vec![
                GraphLabel::Tree,
                GraphLabel::Tree,
                GraphLabel::Dag,
                GraphLabel::Dag,
                GraphLabel::Cyclic,
            ],
        )
    }

    #[test]
    fn majority_vote() {
        let (x, y) = training();
        let model = KNearest::fit(&KnnParams { k: 3, distance_weighted: false }, &x, &y).unwrap();
        assert_eq!(model.predict(&[5.0, 5.05]), GraphLabel::Dag);
        let p = model.predict_proba(&[5.0, 5.05]);
        assert!((p[GraphLabel::Dag.index()] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn exact_match_dominates_weighted_vote() {
        let (x, y) = training();
        let model = KNearest::fit(&KnnParams { k: 3, distance_weighted: true }, &x, &y).unwrap();
        let p = model.predict_proba(&[5.0, 5.2]);
        assert!((p[GraphLabel::Cyclic.index()] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn k_larger_than_training_set_uses_everything() {
        let (x, y) = training();
        let model = KNearest::fit(&KnnParams { k: 50, distance_weighted: false }, &x, &y).unwrap();
        let p = model.predict_proba(&[0.0, 0.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((p[GraphLabel::Dag.index()] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn zero_k_is_rejected() {
        let (x, y) = training();
        assert!(KNearest::fit(&KnnParams { k: 0, distance_weighted: false }, &x, &y).is_err());
    }
}
