//! Evaluation of a fitted model on labelled rows.

use std::fmt;

use serde::Serialize;

use crate::features::FeatureSchema;
use crate::label::GraphLabel;

/// Precision, recall and F1 for one label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: GraphLabel,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics, accuracy and confusion matrix.
///
/// `confusion[t][p]` counts rows with true label `t` predicted as `p`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
    pub confusion: [[usize; GraphLabel::COUNT]; GraphLabel::COUNT],
}

impl ClassificationReport {
    /// Build a report from paired truth and predictions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_predictions(truth: &[GraphLabel], predicted: &[GraphLabel]) -> Self {
        let mut confusion = [[0usize; GraphLabel::COUNT]; GraphLabel::COUNT];
        for (t, p) in truth.iter().zip(predicted) {
            confusion[t.index()][p.index()] += 1;
        }

        let total: usize = confusion.iter().flatten().sum();
        let correct: usize = (0..GraphLabel::COUNT).map(|i| confusion[i][i]).sum();
        let accuracy = ratio(correct, total);

        let classes = GraphLabel::ALL
            .iter()
            .map(|&label| {
                let i = label.index();
                let tp = confusion[i][i];
                let support: usize = confusion[i].iter().sum();
                let predicted_as: usize = confusion.iter().map(|row| row[i]).sum();
                let precision = ratio(tp, predicted_as);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        Self {
            accuracy,
            classes,
            confusion,
        }
    }

    /// Unweighted mean of the per-class F1 scores.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn macro_f1(&self) -> f64 {
        if self.classes.is_empty() {
            return 0.0;
        }
        self.classes.iter().map(|c| c.f1).sum::<f64>() / self.classes.len() as f64
    }

    #[must_use]
    pub fn support(&self) -> usize {
        self.classes.iter().map(|c| c.support).sum()
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>10} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label.name(),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>10} {:>29.2} {:>9}", "accuracy", self.accuracy, self.support())?;
        writeln!(f, "{:>10} {:>29.2} {:>9}", "macro f1", self.macro_f1(), self.support())?;
        writeln!(f)?;
        writeln!(f, "confusion (rows = true, columns = predicted):")?;
        write!(f, "{:>10}", "")?;
        for label in GraphLabel::ALL {
            write!(f, " {:>7}", label.name())?;
        }
        writeln!(f)?;
        for label in GraphLabel::ALL {
            write!(f, "{:>10}", label.name())?;
            for count in self.confusion[label.index()] {
                write!(f, " {count:>7}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A named feature and its importance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// The `limit` most important features, highest first; ties keep schema
/// order.
#[must_use]
pub fn top_features(schema: &FeatureSchema, importances: &[f64], limit: usize) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = schema
        .names()
        .zip(importances)
        .map(|(name, &importance)| FeatureImportance {
            feature: name.to_string(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked.truncate(limit);
    ranked
}
