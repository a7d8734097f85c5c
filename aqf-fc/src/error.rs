//! Error types for aqf-fc

use thiserror::Error;

/// Forecaster error type
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Not enough rows left after dropping incomplete lag windows
    #[error("Insufficient training data: {0} usable rows")]
    InsufficientData(usize),

    /// Linear system could not be solved
    #[error("Singular matrix while fitting linear regression")]
    SingularMatrix,

    /// Artifact does not match the expected feature layout
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// aqf-common error
    #[error("Common error: {0}")]
    Common(#[from] aqf_common::Error),
}

/// Result type for forecaster operations
pub type ForecastResult<T> = Result<T, ForecastError>;
