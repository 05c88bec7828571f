//! Binary classification report

use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Confusion counts plus per-class scores for labels 0 and 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub accuracy: f64,
    pub on_time: ClassScores,
    pub delayed: ClassScores,
}

impl ClassificationReport {
    /// Compare predicted labels with the truth. Pairs are zipped, so the
    /// shorter slice bounds the comparison.
    pub fn compute(y_true: &[i32], y_pred: &[i32]) -> Self {
        let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == 1, p == 1) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fn_ += 1,
            }
        }

        let total = tp + fp + tn + fn_;
        Self {
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
            accuracy: ratio(tp + tn, total),
            on_time: class_scores(tn, fn_, fp),
            delayed: class_scores(tp, fp, fn_),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Scores of one class from its hits, false alarms and misses
fn class_scores(hits: usize, false_alarms: usize, misses: usize) -> ClassScores {
    let precision = ratio(hits, hits + false_alarms);
    let recall = ratio(hits, hits + misses);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassScores {
        precision,
        recall,
        f1_score,
        support: hits + misses,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for (label, s) in [("0", &self.on_time), ("1", &self.delayed)] {
            writeln!(
                f,
                "{:>10} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, s.precision, s.recall, s.f1_score, s.support
            )?;
        }
        write!(
            f,
            "{:>10} {:>32.2} {:>10}",
            "accuracy",
            self.accuracy,
            self.on_time.support + self.delayed.support
        )
    }
}
