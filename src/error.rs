//! Error types for the flight delay pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, DelayError>;

/// Main error type for encoding, labelling, training and persistence
#[derive(Error, Debug)]
pub enum DelayError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid timestamp in column {column} at row {row}: {value}")]
    InvalidTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Degenerate training set: {0}")]
    DegenerateTrainingSet(String),

    #[error("Shape mismatch: {features} feature rows but {targets} target rows")]
    ShapeMismatch { features: usize, targets: usize },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid shape: {0}")]
    ShapeError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for DelayError {
    fn from(err: polars::error::PolarsError) -> Self {
        DelayError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for DelayError {
    fn from(err: serde_json::Error) -> Self {
        DelayError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DelayError {
    fn from(err: ndarray::ShapeError) -> Self {
        DelayError::ShapeError(err.to_string())
    }
}
