//! Error types for the D2H macros

use thiserror::Error;

/// Error type shared by the core transforms
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input file could not be read or decoded
    #[error("Input error: {0}")]
    Input(String),

    /// Validation error (bad binning, mismatched inputs)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
