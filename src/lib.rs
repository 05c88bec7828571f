//! Flight Delay - delay prediction for flights departing SCL
//!
//! This crate provides the full pipeline behind the delay API:
//! - Label derivation from scheduled/actual timestamps
//! - One-hot encoding projected onto a fixed ten-feature schema
//! - Class-weighted gradient-boosted trees
//! - HTTP server and CLI interfaces
//!
//! # Modules
//!
//! - [`preprocessing`] - Labels, categorical encoding, feature schema
//! - [`training`] - Boosted classifier, class weighting, evaluation metrics
//! - [`model`] - The [`DelayModel`](model::DelayModel) tying the pipeline together
//! - [`server`] - HTTP server with `/health` and `/predict`
//! - [`cli`] - Command-line interface
//! - [`utils`] - CSV loading and writing

// Core error handling
pub mod error;

// Pipeline
pub mod preprocessing;
pub mod training;
pub mod model;

// Services
pub mod server;
pub mod cli;

// Utilities
pub mod utils;

pub use error::{DelayError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{DelayError, Result};
    pub use crate::model::{train_test_split, DelayModel, TrainingData, DEFAULT_TARGET};
    pub use crate::preprocessing::{delay_labels, FeatureEncoder, FeatureSchema, TOP_10_FEATURES};
    pub use crate::training::{ClassificationReport, XGBoostClassifier, XGBoostConfig};
    pub use crate::utils::DataLoader;
}
