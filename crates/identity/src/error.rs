//! Error types for MirrorWitness identity operations.
//!
//! Key-store failures are fatal to a witness instance: generating a fresh
//! identity over an unreadable key would silently break the continuity of
//! its attestation history.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Key file unreadable, corrupt or not creatable
    #[error("Key store error at {}: {reason}", .path.display())]
    KeyStore { path: PathBuf, reason: String },

    /// Cryptographic errors
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] mirrorwitness_crypto::CryptoError),
}

impl IdentityError {
    pub(crate) fn key_store(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::KeyStore {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
