//! Data preprocessing module
//!
//! Turns raw flight records into model inputs:
//! - Delay labels from the scheduled/actual timestamp pair
//! - One-hot encoding of airline, flight type and month
//! - Projection of the encoded block onto the fixed feature schema

pub mod encoder;
pub mod labels;
pub mod schema;

pub use encoder::{FeatureEncoder, CATEGORICAL_FIELDS, MES, OPERA, TIPOVUELO};
pub use labels::{delay_label_column, delay_labels, DELAY_THRESHOLD_MINUTES, FECHA_I, FECHA_O};
pub use schema::{project_onto_schema, FeatureSchema, TOP_10_FEATURES};

use crate::error::{DelayError, Result};
use ndarray::Array2;
use polars::prelude::*;

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| -> Result<Vec<f64>> {
            let column = df
                .column(col_name)
                .map_err(|_| DelayError::MissingColumn(col_name.clone()))?;
            let as_f64 = column.cast(&DataType::Float64)?;
            let values: Vec<f64> = as_f64
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}
