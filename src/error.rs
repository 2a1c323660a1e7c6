//! Error types for the diabeval evaluation engine

use thiserror::Error;

/// Result type alias for diabeval operations
pub type Result<T> = std::result::Result<T, DiabevalError>;

/// Main error type for the evaluation engine and its collaborators
#[derive(Error, Debug)]
pub enum DiabevalError {
    /// No dataset has been loaded yet.
    #[error("No dataset loaded")]
    DataUnavailable,

    #[error("Unknown validation method: {0}")]
    UnknownStrategy(String),

    #[error("Unknown classifier: {0}")]
    UnknownClassifier(String),

    /// Admission-control rejection, raised before any fold is evaluated.
    #[error("{strategy} is too expensive for {n_samples} rows (limit {limit})")]
    DatasetTooLargeForStrategy {
        strategy: String,
        n_samples: usize,
        limit: usize,
    },

    /// Labels must be exactly 0 or 1.
    #[error("Invalid label {value} at row {row}: labels must be 0 or 1")]
    InvalidLabel { row: usize, value: f64 },

    /// A per-fold fit/score failure; aborts the whole run.
    #[error("Evaluation of {classifier} failed: {reason}")]
    EvaluationFailed { classifier: String, reason: String },

    /// A persisted blob exists but cannot be decoded. The prediction
    /// path treats this as absent and retrains.
    #[error("Failed to load model {name}: {reason}")]
    ModelLoadFailed { name: String, reason: String },

    #[error("Model not fitted")]
    NotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for DiabevalError {
    fn from(err: polars::error::PolarsError) -> Self {
        DiabevalError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for DiabevalError {
    fn from(err: serde_json::Error) -> Self {
        DiabevalError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for DiabevalError {
    fn from(err: bincode::Error) -> Self {
        DiabevalError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DiabevalError {
    fn from(err: ndarray::ShapeError) -> Self {
        DiabevalError::ShapeMismatch {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
