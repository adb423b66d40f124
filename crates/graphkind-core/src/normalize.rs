//! Feature sanitization and per-column standardization.
//!
//! # Sanitization
//!
//! Before any statistics are taken, NaN becomes `0.0`, `+inf` becomes
//! [`POSITIVE_SENTINEL`] and `-inf` becomes [`NEGATIVE_SENTINEL`].
//!
//! # Standardization
//!
//! [`FeatureNormalizer::fit_transform`] learns a per-column mean and
//! population standard deviation and returns `(x - mean) / std`. Columns with
//! zero spread keep a scale of 1 so they map to 0 instead of NaN.
//! [`FeatureNormalizer::transform`] reuses the learned state and fails with
//! [`NormalizerError::NotFitted`] before a fit.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Rows of feature values, one row per graph.
pub type FeatureMatrix = Vec<Vec<f64>>;

/// Replacement for `+inf`.
pub const POSITIVE_SENTINEL: f64 = 1e6;
/// Replacement for `-inf`.
pub const NEGATIVE_SENTINEL: f64 = -1e6;

const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// Errors from fitting or applying normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizerError {
    /// `transform` called before `fit_transform`.
    #[error("feature normalizer must be fitted before transform")]
    NotFitted,

    /// Fitting needs at least one row.
    #[error("cannot fit normalization on an empty batch")]
    EmptyBatch,

    /// A row does not have the fitted width.
    #[error("row has {found} features, expected {expected}")]
    WidthMismatch { expected: usize, found: usize },
}

impl NormalizerError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFitted => ErrorCode::NotFitted,
            Self::EmptyBatch => ErrorCode::InsufficientData,
            Self::WidthMismatch { .. } => ErrorCode::SchemaMismatch,
        }
    }
}

/// Map a non-finite value onto its finite replacement.
#[must_use]
pub fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value == f64::INFINITY {
        POSITIVE_SENTINEL
    } else if value == f64::NEG_INFINITY {
        NEGATIVE_SENTINEL
    } else {
        value
    }
}

/// Sanitize every entry of `rows` in place.
pub fn sanitize_rows(rows: &mut FeatureMatrix) {
    for value in rows.iter_mut().flatten() {
        *value = sanitize(*value);
    }
}

/// Learned per-column statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationState {
    pub mean: Vec<f64>,
    /// Divisor per column (the standard deviation, or 1 for flat columns).
    pub scale: Vec<f64>,
}

impl NormalizationState {
    /// Learn mean and scale from sanitized `rows`.
    ///
    /// # Errors
    ///
    /// Fails on an empty batch or rows of differing widths.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, NormalizerError> {
        let width = rows.first().ok_or(NormalizerError::EmptyBatch)?.len();
        check_widths(rows, width)?;

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut scale {
            let std = (*s / n).sqrt();
            *s = if std < MIN_SCALE { 1.0 } else { std };
        }

        Ok(Self { mean, scale })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one row.
    ///
    /// # Errors
    ///
    /// Fails when the row width differs from the fitted width.
    pub fn apply(&self, row: &[f64]) -> Result<Vec<f64>, NormalizerError> {
        if row.len() != self.width() {
            return Err(NormalizerError::WidthMismatch {
                expected: self.width(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((v, m), s)| (sanitize(*v) - m) / s)
            .collect())
    }
}

fn check_widths(rows: &[Vec<f64>], expected: usize) -> Result<(), NormalizerError> {
    match rows.iter().find(|row| row.len() != expected) {
        Some(row) => Err(NormalizerError::WidthMismatch {
            expected,
            found: row.len(),
        }),
        None => Ok(()),
    }
}

/// Fit-once, apply-many standardizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalizer {
    state: Option<NormalizationState>,
}

impl FeatureNormalizer {
    #[must_use]
    pub const fn new() -> Self {
        Self { state: None }
    }

    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub const fn state(&self) -> Option<&NormalizationState> {
        self.state.as_ref()
    }

    /// Sanitize `rows`, learn their statistics and return them standardized.
    ///
    /// # Errors
    ///
    /// Fails on an empty batch or ragged rows; the normalizer stays unfitted.
    pub fn fit_transform(&mut self, mut rows: FeatureMatrix) -> Result<FeatureMatrix, NormalizerError> {
        sanitize_rows(&mut rows);
        let state = NormalizationState::fit(&rows)?;
        let out = rows
            .iter()
            .map(|row| state.apply(row))
            .collect::<Result<FeatureMatrix, _>>()?;
        self.state = Some(state);
        Ok(out)
    }

    /// Sanitize and standardize `rows` with the fitted statistics.
    ///
    /// # Errors
    ///
    /// [`NormalizerError::NotFitted`] before a fit, or a width mismatch.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<FeatureMatrix, NormalizerError> {
        let state = self.state.as_ref().ok_or(NormalizerError::NotFitted)?;
        rows.iter().map(|row| state.apply(row)).collect()
    }

    /// Standardize a single row.
    ///
    /// # Errors
    ///
    /// Same as [`FeatureNormalizer::transform`].
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, NormalizerError> {
        self.state
            .as_ref()
            .ok_or(NormalizerError::NotFitted)?
            .apply(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_non_finite() {
        assert!(sanitize(f64::NAN).abs() < f64::EPSILON);
        assert!((sanitize(f64::INFINITY) - 1e6).abs() < f64::EPSILON);
        assert!((sanitize(f64::NEG_INFINITY) + 1e6).abs() < f64::EPSILON);
        assert!((sanitize(2.5) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn transform_before_fit_is_a_state_error() {
        let normalizer = FeatureNormalizer::new();
        assert_eq!(
            normalizer.transform(&[vec![1.0]]),
            Err(NormalizerError::NotFitted)
        );
        assert_eq!(normalizer.transform_row(&[1.0]), Err(NormalizerError::NotFitted));
        assert_eq!(NormalizerError::NotFitted.code(), ErrorCode::NotFitted);
    }

    #[test]
    fn fit_transform_standardizes_columns() {
        let mut normalizer = FeatureNormalizer::new();
        let out = normalizer
            .fit_transform(vec![vec![1.0, 5.0], vec![3.0, 5.0]])
            .unwrap();
        // Column 0: mean 2, std 1. Column 1 is flat → scale 1 → zeros.
        assert_eq!(out, vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
        assert!(normalizer.is_fitted());

        let again = normalizer.transform(&[vec![4.0, 6.0]]).unwrap();
        assert_eq!(again, vec![vec![2.0, 1.0]]);
    }

    #[test]
    fn non_finite_inputs_never_reach_the_output() {
        let mut normalizer = FeatureNormalizer::new();
        let out = normalizer
            .fit_transform(vec![
                vec![f64::NAN, f64::INFINITY],
                vec![1.0, f64::NEG_INFINITY],
                vec![2.0, 3.0],
            ])
            .unwrap();
        assert!(out.iter().flatten().all(|v| v.is_finite()));

        let state = normalizer.state().unwrap();
        assert!((state.mean[0] - 1.0).abs() < 1e-12);

        let later = normalizer.transform(&[vec![f64::NAN, f64::INFINITY]]).unwrap();
        assert!(later.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_and_ragged_batches_fail() {
        let mut normalizer = FeatureNormalizer::new();
        assert_eq!(normalizer.fit_transform(vec![]), Err(NormalizerError::EmptyBatch));
        assert_eq!(
            normalizer.fit_transform(vec![vec![1.0, 2.0], vec![1.0]]),
            Err(NormalizerError::WidthMismatch { expected: 2, found: 1 })
        );
        assert!(!normalizer.is_fitted());
    }

    #[test]
    fn width_mismatch_after_fit() {
        let mut normalizer = FeatureNormalizer::new();
        normalizer.fit_transform(vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(
            normalizer.transform_row(&[1.0]),
            Err(NormalizerError::WidthMismatch { expected: 2, found: 1 })
        );
    }
}
