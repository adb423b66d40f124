//! Random forest of CART trees.
//!
//! # Trees
//!
//! Each tree is grown on a bootstrap sample. At every node a random subset
//! of `ceil(sqrt(features))` features is searched for the threshold that
//! minimizes the weighted Gini impurity of the two children; when none of
//! them improves on the parent, the remaining features are searched too.
//! A node becomes a leaf when it is pure, holds fewer than
//! `min_samples_split` rows, reaches `max_depth`, or has no improving split.
//! Leaves store class frequencies.
//!
//! Trees are stored as flat node arrays and grown with an explicit work
//! stack, so deep trees cannot overflow the call stack.
//!
//! # Importances
//!
//! Each split credits its feature with the impurity decrease
//! `n·G(parent) − n_l·G(left) − n_r·G(right)`. Per-tree totals are
//! normalized to 1, averaged over trees, and normalized again.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{Classifier, FitError, check_training_set, normalize_weights};
use crate::label::GraphLabel;

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Leaf {
        proba: [f64; GraphLabel::COUNT],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One fitted CART tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn leaf_proba(&self, row: &[f64]) -> [f64; GraphLabel::COUNT] {
        let mut cursor = 0;
        loop {
            match self.nodes.get(cursor) {
                Some(TreeNode::Leaf { proba }) => return *proba,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    cursor = if value <= *threshold { *left } else { *right };
                }
                None => return normalize_weights([0.0; GraphLabel::COUNT]),
            }
        }
    }

    /// Number of nodes (splits and leaves).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    width: usize,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit `params.n_estimators` trees on bootstrap samples of `(x, y)`.
    ///
    /// # Errors
    ///
    /// Fails on invalid input or zero estimators.
    pub fn fit(params: &ForestParams, x: &[Vec<f64>], y: &[GraphLabel], seed: u64) -> Result<Self, FitError> {
        let width = check_training_set(x, y)?;
        if params.n_estimators == 0 {
            return Err(FitError::InvalidParams("n_estimators must be at least 1".into()));
        }
        if params.min_samples_split < 2 {
            return Err(FitError::InvalidParams("min_samples_split must be at least 2".into()));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let n = x.len();
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut importances = vec![0.0; width];

        for _ in 0..params.n_estimators {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut tree_importance = vec![0.0; width];
            let tree = TreeGrower {
                x,
                y,
                params,
                width,
                rng: &mut rng,
                importances: &mut tree_importance,
            }
            .grow(sample);
            trees.push(tree);

            let total: f64 = tree_importance.iter().sum();
            if total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(&tree_importance) {
                    *acc += v / total;
                }
            }
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        Ok(Self {
            params: params.clone(),
            width,
            trees,
            importances,
        })
    }

    #[must_use]
    pub const fn params(&self) -> &ForestParams {
        &self.params
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Normalized importance per feature column (sums to 1 unless no tree
    /// ever split).
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

impl Classifier for RandomForest {
    #[allow(clippy::cast_precision_loss)]
    fn predict_proba(&self, row: &[f64]) -> [f64; GraphLabel::COUNT] {
        let mut sum = [0.0; GraphLabel::COUNT];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.leaf_proba(row)) {
                *acc += p;
            }
        }
        normalize_weights(sum)
    }
}

// ---------------------------------------------------------------------------
// Tree growing
// ---------------------------------------------------------------------------

struct TreeGrower<'a> {
    x: &'a [Vec<f64>],
    y: &'a [GraphLabel],
    params: &'a ForestParams,
    width: usize,
    rng: &'a mut StdRng,
    importances: &'a mut [f64],
}

struct Split {
    feature: usize,
    threshold: f64,
    /// `n_l·G(left) + n_r·G(right)`.
    weighted_impurity: f64,
}

impl TreeGrower<'_> {
    #[allow(clippy::cast_precision_loss)]
    fn grow(mut self, root: Vec<usize>) -> DecisionTree {
        let placeholder = TreeNode::Leaf {
            proba: [0.0; GraphLabel::COUNT],
        };
        let mut nodes = vec![placeholder.clone()];
        let mut stack: Vec<(Vec<usize>, usize, usize)> = vec![(root, 0, 0)];

        while let Some((rows, depth, slot)) = stack.pop() {
            let counts = self.class_counts(&rows);
            let n = rows.len() as f64;
            let parent = n * gini(&counts);

            let splittable = parent > 0.0
                && rows.len() >= self.params.min_samples_split
                && self.params.max_depth.is_none_or(|max| depth < max);

            let split = if splittable {
                self.best_split(&rows, parent)
            } else {
                None
            };

            let Some(split) = split else {
                nodes[slot] = TreeNode::Leaf {
                    proba: normalize_weights(counts.map(|c| c as f64)),
                };
                continue;
            };

            self.importances[split.feature] += parent - split.weighted_impurity;

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .partition(|&&i| self.x[i][split.feature] <= split.threshold);

            let left = nodes.len();
            nodes.push(placeholder.clone());
            let right = nodes.len();
            nodes.push(placeholder.clone());
            nodes[slot] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            stack.push((right_rows, depth + 1, right));
            stack.push((left_rows, depth + 1, left));
        }

        DecisionTree { nodes }
    }

    fn class_counts(&self, rows: &[usize]) -> [usize; GraphLabel::COUNT] {
        let mut counts = [0; GraphLabel::COUNT];
        for &i in rows {
            counts[self.y[i].index()] += 1;
        }
        counts
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn best_split(&mut self, rows: &[usize], parent: f64) -> Option<Split> {
        let mut order: Vec<usize> = (0..self.width).collect();
        order.shuffle(&mut *self.rng);
        let sampled = ((self.width as f64).sqrt().ceil() as usize).max(1);

        let mut best: Option<Split> = None;
        for (visited, &feature) in order.iter().enumerate() {
            if visited >= sampled && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_threshold(rows, feature) {
                let improves = candidate.weighted_impurity < parent - 1e-12;
                let better = best
                    .as_ref()
                    .is_none_or(|b| candidate.weighted_impurity < b.weighted_impurity);
                if improves && better {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    #[allow(clippy::cast_precision_loss)]
    fn best_threshold(&self, rows: &[usize], feature: usize) -> Option<Split> {
        let mut pairs: Vec<(f64, usize)> = rows
            .iter()
            .map(|&i| (self.x[i][feature], self.y[i].index()))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut right = [0usize; GraphLabel::COUNT];
        for &(_, class) in &pairs {
            right[class] += 1;
        }
        let mut left = [0usize; GraphLabel::COUNT];
        let total = pairs.len();

        let mut best: Option<Split> = None;
        for i in 0..total.saturating_sub(1) {
            let (value, class) = pairs[i];
            left[class] += 1;
            right[class] -= 1;

            let next = pairs[i + 1].0;
            if value >= next {
                continue;
            }
            let n_left = (i + 1) as f64;
            let n_right = (total - i - 1) as f64;
            let weighted = n_left * gini(&left) + n_right * gini(&right);
            if best.as_ref().is_none_or(|b| weighted < b.weighted_impurity) {
                let mid = value + (next - value) / 2.0;
                let threshold = if mid < next { mid } else { value };
                best = Some(Split {
                    feature,
                    threshold,
                    weighted_impurity: weighted,
                });
            }
        }
        best
    }
}

#[allow(clippy::cast_precision_loss)]
fn gini(counts: &[usize; GraphLabel::COUNT]) -> f64 {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
