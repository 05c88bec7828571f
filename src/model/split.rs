//! Seeded train/test split of raw flight records

use crate::error::{DelayError, Result};
use polars::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Shuffle rows with `seed` and hold out `ceil(rows * test_size)` of them.
///
/// Returns `(train, test)`.
pub fn train_test_split(data: &DataFrame, test_size: f64, seed: u64) -> Result<(DataFrame, DataFrame)> {
    if !(0.0..1.0).contains(&test_size) {
        return Err(DelayError::InvalidInput(format!(
            "test_size must be in [0, 1), got {}",
            test_size
        )));
    }

    let n_rows = data.height();
    let mut indices: Vec<IdxSize> = (0..n_rows as IdxSize).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_rows as f64) * test_size).ceil() as usize;
    let (test_idx, train_idx) = indices.split_at(n_test.min(n_rows));

    let take = |idx: &[IdxSize]| -> Result<DataFrame> {
        let idx = IdxCa::from_vec("idx".into(), idx.to_vec());
        Ok(data.take(&idx)?)
    };

    Ok((take(train_idx)?, take(test_idx)?))
}
