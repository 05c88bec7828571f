//! Flight delay model
//!
//! [`DelayModel`] ties the pipeline together: labels and features are prepared
//! from raw flight records, the booster is trained under class imbalance, and
//! predictions are served from the trained parameters.
//!
//! The trained-parameters slot is an owned field. [`DelayModel::fit`] takes
//! `&mut self` and is the only writer; [`DelayModel::predict`] takes `&self`,
//! so a trained model can be shared behind an `Arc` by concurrent readers.

mod split;

pub use split::train_test_split;

use crate::error::{DelayError, Result};
use crate::preprocessing::{columns_to_array2, delay_label_column, FeatureEncoder, FeatureSchema};
use crate::training::{scale_pos_weight, XGBoostClassifier, XGBoostConfig};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Name of the label column used throughout training
pub const DEFAULT_TARGET: &str = "delay";

/// Encoded features together with their labels
#[derive(Debug, Clone)]
pub struct TrainingData {
    /// One row per flight, one `Int32` column per schema feature
    pub features: DataFrame,
    /// Single `Int32` column holding the 0/1 delay label
    pub target: DataFrame,
}

impl TrainingData {
    pub fn n_rows(&self) -> usize {
        self.features.height()
    }

    /// Target column as plain labels
    pub fn labels(&self) -> Result<Vec<i32>> {
        target_labels(&self.target)
    }
}

/// Binary delay classifier over the fixed flight feature schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelayModel {
    encoder: FeatureEncoder,
    classifier: Option<XGBoostClassifier>,
}

impl DelayModel {
    /// Untrained model over the default ten-feature schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Untrained model over a custom schema
    pub fn with_schema(schema: FeatureSchema) -> Self {
        Self {
            encoder: FeatureEncoder::new(schema),
            classifier: None,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.encoder.schema()
    }

    pub fn is_trained(&self) -> bool {
        self.classifier.is_some()
    }

    /// Encode features and fetch labels for training.
    ///
    /// When `target_column` is not present in `data`, labels are derived from
    /// `Fecha-I`/`Fecha-O` and returned under that name. An existing column is
    /// used as is, cast to `Int32`.
    pub fn prepare_training_data(&self, data: &DataFrame, target_column: &str) -> Result<TrainingData> {
        let labels = match data.column(target_column) {
            Ok(existing) => existing.cast(&DataType::Int32)?,
            Err(_) => delay_label_column(data, target_column)?,
        };
        let target = DataFrame::new(vec![labels])?;
        let features = self.encoder.encode(data)?;
        Ok(TrainingData { features, target })
    }

    /// Encode features for inference
    pub fn prepare_inference_features(&self, data: &DataFrame) -> Result<DataFrame> {
        self.encoder.encode(data)
    }

    /// Train the booster on encoded `features` and a one-column `target`.
    ///
    /// The positive class is scaled by the negative/positive ratio of the
    /// labels. A successful fit replaces any earlier model; a failed one leaves
    /// it untouched.
    pub fn fit(&mut self, features: &DataFrame, target: &DataFrame) -> Result<()> {
        let labels = target_labels(target)?;
        if features.height() != labels.len() {
            return Err(DelayError::ShapeMismatch {
                features: features.height(),
                targets: labels.len(),
            });
        }

        let weight = scale_pos_weight(&labels)?;
        let x = self.feature_matrix(features)?;
        let y: Array1<f64> = labels.iter().map(|&label| f64::from(label)).collect();

        let start = Instant::now();
        let mut classifier = XGBoostClassifier::new(XGBoostConfig::delay_model(weight));
        classifier.fit(&x, &y)?;

        info!(
            rows = x.nrows(),
            features = x.ncols(),
            scale_pos_weight = weight,
            trees = classifier.n_trees(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Delay model trained"
        );
        self.classifier = Some(classifier);
        Ok(())
    }

    /// Predict 0/1 per row of `features`, in row order.
    ///
    /// An untrained model answers 0 for every row.
    pub fn predict(&self, features: &DataFrame) -> Result<Vec<i32>> {
        let Some(classifier) = &self.classifier else {
            debug!(rows = features.height(), "Model not trained, returning default predictions");
            return Ok(vec![0; features.height()]);
        };

        let x = self.feature_matrix(features)?;
        let predictions = classifier.predict(&x)?;
        Ok(predictions.iter().map(|&p| i32::from(p > 0.5)).collect())
    }

    /// Split-count importance of each schema feature, when trained
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = self.classifier.as_ref()?.feature_importances()?;
        Some(
            self.schema()
                .columns()
                .iter()
                .cloned()
                .zip(importances.iter().copied())
                .collect(),
        )
    }

    /// Save the model (schema and ensemble) as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a model written by [`DelayModel::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&json)?;
        Ok(model)
    }

    fn feature_matrix(&self, features: &DataFrame) -> Result<Array2<f64>> {
        let projected = self.schema().project(features)?;
        columns_to_array2(&projected, self.schema().columns())
    }
}

/// Labels from the `delay` column, or from the only column of a one-column frame
fn target_labels(target: &DataFrame) -> Result<Vec<i32>> {
    let column = match target.column(DEFAULT_TARGET) {
        Ok(column) => column,
        Err(_) if target.width() == 1 => &target.get_columns()[0],
        Err(_) => return Err(DelayError::MissingColumn(DEFAULT_TARGET.to_string())),
    };

    let as_int = column.cast(&DataType::Int32)?;
    as_int
        .i32()?
        .into_iter()
        .enumerate()
        .map(|(row, label)| {
            label.ok_or_else(|| DelayError::InvalidInput(format!("missing label at row {}", row)))
        })
        .collect()
}
