//! Fixed feature schema and projection onto it
//!
//! One-hot encoding only produces indicator columns for categories that occur
//! in the batch at hand. Projecting onto a declared column list makes a single
//! request row and a full training set produce identical columns.

use crate::error::{DelayError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The ten indicators the delay model is trained on, in canonical order.
pub const TOP_10_FEATURES: [&str; 10] = [
    "OPERA_Latin American Wings",
    "MES_7",
    "MES_10",
    "OPERA_Grupo LATAM",
    "MES_12",
    "TIPOVUELO_I",
    "MES_4",
    "MES_11",
    "OPERA_Sky Airline",
    "OPERA_Copa Air",
];

/// Ordered list of feature column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            columns: TOP_10_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FeatureSchema {
    /// Create a schema from an explicit column list.
    ///
    /// The list must be non-empty and free of duplicates.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(DelayError::InvalidInput(
                "feature schema must name at least one column".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DelayError::InvalidInput(format!(
                    "duplicate feature column in schema: {}",
                    name
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Project a frame onto this schema
    pub fn project(&self, frame: &DataFrame) -> Result<DataFrame> {
        project_onto_schema(frame, &self.columns)
    }
}

/// Reindex `frame` onto `schema`.
///
/// Columns not named in `schema` are dropped, schema columns missing from the
/// frame are filled with zeros, and the result is ordered as `schema` and typed
/// `Int32`. Nulls in kept columns become 0.
pub fn project_onto_schema(frame: &DataFrame, schema: &[String]) -> Result<DataFrame> {
    project_columns(frame.get_columns(), frame.height(), schema)
}

/// Same as [`project_onto_schema`] over a loose set of columns. The row count is
/// passed explicitly so that an empty column set still yields `n_rows` rows.
pub(crate) fn project_columns(
    columns: &[Column],
    n_rows: usize,
    schema: &[String],
) -> Result<DataFrame> {
    let projected = schema
        .iter()
        .map(|name| -> Result<Column> {
            let Some(column) = columns.iter().find(|c| c.name().as_str() == name.as_str()) else {
                return Ok(Series::new(name.as_str().into(), vec![0i32; n_rows]).into());
            };
            if column.len() != n_rows {
                return Err(DelayError::ShapeError(format!(
                    "column {} has {} rows, expected {}",
                    name,
                    column.len(),
                    n_rows
                )));
            }
            let as_int = column.cast(&DataType::Int32)?;
            let values: Vec<i32> = as_int
                .i32()?
                .into_iter()
                .map(|v| v.unwrap_or(0))
                .collect();
            Ok(Series::new(name.as_str().into(), values).into())
        })
        .collect::<Result<Vec<Column>>>()?;

    Ok(DataFrame::new(projected)?)
}
