//! Error types for famcal.

use thiserror::Error;

/// Errors that can occur in famcal operations.
#[derive(Error, Debug)]
pub enum FamcalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Expansion error: {0}")]
    Expansion(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Fetch timed out after {0}s")]
    FetchTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for famcal operations.
pub type FamcalResult<T> = Result<T, FamcalError>;
