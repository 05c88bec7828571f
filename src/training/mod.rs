//! Model training module
//!
//! - Positive-class weighting for imbalanced labels
//! - XGBoost-style gradient-boosted trees with logistic loss
//! - Classification report for held-out evaluation

pub mod class_weight;
pub mod metrics;
pub mod xgboost;

pub use class_weight::scale_pos_weight;
pub use metrics::{ClassScores, ClassificationReport};
pub use xgboost::{XGBoostClassifier, XGBoostConfig};
