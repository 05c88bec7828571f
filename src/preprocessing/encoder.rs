//! Categorical feature encoding for flight records

use super::schema::{project_columns, FeatureSchema};
use crate::error::{DelayError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Airline operating the flight
pub const OPERA: &str = "OPERA";
/// Flight type: `N` (national) or `I` (international)
pub const TIPOVUELO: &str = "TIPOVUELO";
/// Month of operation, 1-12
pub const MES: &str = "MES";

/// Raw fields that are one-hot encoded, in concatenation order
pub const CATEGORICAL_FIELDS: [&str; 3] = [OPERA, TIPOVUELO, MES];

/// Encodes raw flight records into the fixed indicator matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
}

impl FeatureEncoder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// One-hot encode `OPERA`, `TIPOVUELO` and `MES`, then project the result
    /// onto the schema. The output has one row per input row and exactly the
    /// schema's columns, whatever categories the batch contains.
    pub fn encode(&self, data: &DataFrame) -> Result<DataFrame> {
        let n_rows = data.height();
        let mut generated = Vec::new();
        for field in CATEGORICAL_FIELDS {
            generated.extend(one_hot(data, field)?);
        }
        project_columns(&generated, n_rows, self.schema.columns())
    }
}

/// One `Int32` indicator column per distinct non-null value of `field`,
/// named `<field>_<value>` and ordered by value text.
pub fn one_hot(data: &DataFrame, field: &str) -> Result<Vec<Column>> {
    let values = categorical_values(data, field)?;
    let categories: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();

    Ok(categories
        .into_iter()
        .map(|category| {
            let indicator: Vec<i32> = values
                .iter()
                .map(|v| i32::from(v.as_deref() == Some(category)))
                .collect();
            Column::from(Series::new(format!("{}_{}", field, category).into(), indicator))
        })
        .collect())
}

/// Render a column as category codes. Integers keep their decimal text so that
/// month 7 becomes `MES_7`; floats are truncated to integers first.
fn categorical_values(data: &DataFrame, field: &str) -> Result<Vec<Option<String>>> {
    let column = data
        .column(field)
        .map_err(|_| DelayError::MissingColumn(field.to_string()))?;

    let text = if column.dtype().is_float() {
        column.cast(&DataType::Int64)?.cast(&DataType::String)?
    } else {
        column.cast(&DataType::String)?
    };

    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}
