//! Positive-class weighting for imbalanced delay labels

use crate::error::{DelayError, Result};

/// Ratio of negative to positive examples, `count(0) / count(1)`.
///
/// Used as the booster's positive-class scale. A batch without positives has
/// no defined ratio and is rejected.
pub fn scale_pos_weight(labels: &[i32]) -> Result<f64> {
    let negatives = labels.iter().filter(|&&y| y == 0).count();
    let positives = labels.iter().filter(|&&y| y == 1).count();

    if positives == 0 {
        return Err(DelayError::DegenerateTrainingSet(format!(
            "no delayed flights among {} training labels",
            labels.len()
        )));
    }

    Ok(negatives as f64 / positives as f64)
}
