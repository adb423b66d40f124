//! Label-stratified sampling.
//!
//! Both helpers shuffle each class's row indices with a seeded RNG and deal
//! them out, so every part keeps roughly the class proportions of the whole
//! and the same seed always produces the same partition.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::TrainError;
use crate::label::GraphLabel;

fn shuffled_by_class(labels: &[GraphLabel], rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut by_class = vec![Vec::new(); GraphLabel::COUNT];
    for (i, label) in labels.iter().enumerate() {
        by_class[label.index()].push(i);
    }
    for rows in &mut by_class {
        rows.shuffle(rng);
    }
    by_class
}

/// Split row indices into `(train, holdout)` with `fraction` of each class
/// held out.
///
/// Classes with at least two rows contribute at least one holdout row.
/// Both returned index lists are sorted.
///
/// # Errors
///
/// [`TrainError::InsufficientData`] when either side would be empty or the
/// fraction is outside `(0, 1)`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn stratified_split(
    labels: &[GraphLabel],
    fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), TrainError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(TrainError::InsufficientData(format!(
            "validation fraction {fraction} must be between 0 and 1"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut holdout = Vec::new();

    for rows in shuffled_by_class(labels, &mut rng) {
        let mut take = (rows.len() as f64 * fraction).round() as usize;
        if rows.len() >= 2 {
            take = take.clamp(1, rows.len() - 1);
        } else {
            take = 0;
        }
        holdout.extend_from_slice(&rows[..take]);
        train.extend_from_slice(&rows[take..]);
    }

    if train.is_empty() || holdout.is_empty() {
        return Err(TrainError::InsufficientData(format!(
            "{} rows cannot be split into train and validation parts",
            labels.len()
        )));
    }

    train.sort_unstable();
    holdout.sort_unstable();
    Ok((train, holdout))
}

/// Partition row indices into `k` folds for cross-validation.
///
/// Each class is dealt round-robin, continuing from where the previous
/// class stopped, so fold sizes differ by at most one.
///
/// # Errors
///
/// [`TrainError::InsufficientData`] when `k < 2` or there are fewer rows
/// than folds.
pub fn stratified_k_folds(labels: &[GraphLabel], k: usize, seed: u64) -> Result<Vec<Vec<usize>>, TrainError> {
    if k < 2 {
        return Err(TrainError::InsufficientData(format!(
            "cross-validation needs at least 2 folds, got {k}"
        )));
    }
    if labels.len() < k {
        return Err(TrainError::InsufficientData(format!(
            "{} rows cannot fill {k} folds",
            labels.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds = vec![Vec::new(); k];
    let mut next = 0;
    for rows in shuffled_by_class(labels, &mut rng) {
        for row in rows {
            folds[next].push(row);
            next = (next + 1) % k;
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

/// Select `rows` of a matrix and their labels.
pub fn gather<T: Clone>(items: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|&i| items[i].clone()).collect()
}
