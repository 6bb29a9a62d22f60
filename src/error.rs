//! Error types for the screening core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for screening operations
pub type Result<T> = std::result::Result<T, ScreeningError>;

/// Main error type for the screening core
#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Schema error: none of the target columns {aliases:?} is present")]
    SchemaError { aliases: Vec<String> },

    #[error("Insufficient features: found {found} of {expected} canonical columns, need at least {required}")]
    InsufficientFeatures {
        found: usize,
        expected: usize,
        required: usize,
    },

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Persistence mismatch: {0}")]
    PersistenceMismatch(String),

    #[error("Model not ready: bootstrap has not completed")]
    ModelNotReady,

    #[error("Unknown category {value:?} for feature {feature}")]
    UnknownCategory { feature: String, value: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl ScreeningError {
    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScreeningError::ModelNotReady)
    }
}

impl From<polars::error::PolarsError> for ScreeningError {
    fn from(err: polars::error::PolarsError) -> Self {
        ScreeningError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ScreeningError {
    fn from(err: serde_json::Error) -> Self {
        ScreeningError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for ScreeningError {
    fn from(err: bincode::Error) -> Self {
        ScreeningError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ScreeningError {
    fn from(err: ndarray::ShapeError) -> Self {
        ScreeningError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
