//! Error types for MirrorWitness protocol operations.
//!
//! Per-message failures at a witness and per-target failures at the
//! producer are reported through these variants and contained; only
//! configuration errors are fatal here. Key-store failures surface from
//! `mirrorwitness-identity` before a node is built.

use mirrorwitness_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur in protocol operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Authentication tag mismatch
    #[error("Authentication failed")]
    Authentication,

    /// Malformed hex or JSON on the wire
    #[error("Decode error: {0}")]
    Decode(String),

    /// Artifact content failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection refused, reset or otherwise failed
    #[error("Transport error to {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// A delivery deadline passed
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Attestation returned by a witness did not check out
    #[error("Attestation rejected: {0}")]
    AttestationRejected(String),

    /// Cryptographic errors
    #[error("Cryptographic error: {0}")]
    Crypto(CryptoError),

    /// Network I/O errors
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CryptoError> for MeshError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Encoding { reason } => MeshError::Decode(reason),
            e if e.is_validation() => MeshError::Validation(e.to_string()),
            e => MeshError::Crypto(e),
        }
    }
}

impl MeshError {
    pub(crate) fn transport(endpoint: &str, reason: impl ToString) -> Self {
        MeshError::Transport {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for protocol operations.
pub type MeshResult<T> = Result<T, MeshError>;
