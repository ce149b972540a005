//! Core error types

use thiserror::Error;

/// Core error type for MirrorWitness
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telemetry source could not produce an observation
    #[error("Telemetry unavailable: {0}")]
    Telemetry(String),

    /// Downstream storage or ledger rejected a request
    #[error("Ledger sink error: {0}")]
    Sink(String),

    /// JSON encoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
