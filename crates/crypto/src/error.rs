//! Error types for sealing, authentication and signing.

use thiserror::Error;

/// Result type for crypto operations
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Errors raised by the cryptographic primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A field is missing, non-finite or out of range
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// Artifact bytes could not be parsed
    #[error("Malformed artifact: {reason}")]
    Malformed { reason: String },

    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Hex or length decoding failed
    #[error("Encoding error: {reason}")]
    Encoding { reason: String },

    #[error("Cryptographic error: {reason}")]
    CryptoError { reason: String },

    /// Signature did not verify
    #[error("Signature verification failed")]
    BadSignature,
}

impl CryptoError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this is a validation failure of artifact content.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidField { .. } | Self::Malformed { .. })
    }
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        Self::Encoding {
            reason: e.to_string(),
        }
    }
}
