//! Cryptographic primitives and operations for the MirrorWitness system.
//!
//! This crate provides the cryptographic foundation for the attestation
//! protocol: sealing and content addressing of observations, shared-secret
//! message authentication, witness signatures and constraint proofs.
//!
//! # Core Capabilities
//!
//! - **Sealing & Addressing**: Bind observations to a validity window and nonce,
//!   derive content identifiers from the exact serialized bytes
//! - **Message Authentication**: HMAC tags with constant-time verification
//! - **Digital Signatures**: Ed25519 signing of raw payload bytes
//! - **Constraint Proofs**: Commitment + disclosed-result checks over batches
//!
//! # Supported Algorithms
//!
//! - **Signatures**: Ed25519
//! - **Hashing**: BLAKE3 (content identifiers, payload hashes, commitments)
//! - **Message Authentication**: HMAC-SHA256
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Secrets must never be logged or hardcoded
//! - Use constant-time operations where applicable
//! - Sign and hash the bytes that were received, never a re-encoding

pub mod auth;
pub mod constraint;
pub mod error;
pub mod seal;
pub mod signing;

#[cfg(test)]
mod test_vectors;

pub use auth::{tag, verify, verify_hex, AuthTag, SharedSecret};
pub use constraint::{
    AggregateStats, ChainSubmission, CheckedField, ConstraintError, ConstraintProof,
    ConstraintProver, ConstraintResult, PublicInputs, ThresholdConfig, ThresholdProver,
};
pub use error::{CryptoError, CryptoResult};
pub use seal::{
    address_of, hash_payload, seal, seal_with_random_nonce, ContentId, SealedArtifact,
    CID_HEX_LEN, DEFAULT_SEAL_DURATION_SECS,
};
pub use signing::{
    public_key_of, sign, verify_signature, verify_signature_hex, PayloadSigner, SigningMetrics,
};
