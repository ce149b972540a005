//! Error types for constraint proof operations.

use thiserror::Error;

/// Result type for constraint operations
pub type ConstraintResult<T> = std::result::Result<T, ConstraintError>;

/// Error types for constraint proof operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    /// No observations to prove over
    #[error("Empty batch: at least one observation is required")]
    EmptyBatch,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Commitment or digest computation failed
    #[error("Hash error: {0}")]
    HashError(String),
}
