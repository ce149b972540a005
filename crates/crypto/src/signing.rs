//! Payload Signing - Witness Attestation Signatures
//!
//! This module provides the Ed25519 signing used by witnesses:
//! - Signs the exact raw payload bytes it is handed, never a re-encoding
//! - Verifies signatures against a disclosed public key
//! - Exposes stable public key identifiers and counters for observability
//!
//! # Security Model
//!
//! - Private keys never leave this type and are zeroized after import
//! - Signatures are deterministic for the same key and input
//! - A [`PayloadSigner`] is read-only after construction and can be shared
//!   across connections behind an `Arc`

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};

/// Ed25519 secret key length.
pub const SECRET_KEY_LEN: usize = 32;

/// Counters for observability.
#[derive(Debug, Default)]
pub struct SigningMetrics {
    payloads_signed_total: AtomicU64,
}

impl SigningMetrics {
    pub fn payloads_signed_total(&self) -> u64 {
        self.payloads_signed_total.load(Ordering::Relaxed)
    }
}

/// Ed25519 signer for sealed artifact payloads.
pub struct PayloadSigner {
    /// Active signing key
    signing_key: SigningKey,
    /// Public key identifier
    public_key_id: String,
    metrics: SigningMetrics,
}

impl PayloadSigner {
    /// Creates a signer with a freshly generated key.
    ///
    /// Witnesses persist their key through the identity key store instead.
    pub fn generate() -> Self {
        let mut secret_key_bytes = generate_secret_key();
        let signer = Self::from_array(&secret_key_bytes);
        secret_key_bytes.zeroize();
        signer
    }

    /// Creates a signer from existing private key bytes.
    ///
    /// # Security
    /// The intermediate key copy is zeroized after use.
    pub fn from_key(key_bytes: &[u8]) -> CryptoResult<Self> {
        if key_bytes.len() != SECRET_KEY_LEN {
            return Err(CryptoError::CryptoError {
                reason: format!(
                    "Invalid key length: {} (expected {})",
                    key_bytes.len(),
                    SECRET_KEY_LEN
                ),
            });
        }

        let mut key_array = [0u8; SECRET_KEY_LEN];
        key_array.copy_from_slice(key_bytes);
        let signer = Self::from_array(&key_array);
        key_array.zeroize();

        Ok(signer)
    }

    fn from_array(key: &[u8; SECRET_KEY_LEN]) -> Self {
        let signing_key = SigningKey::from_bytes(key);
        let public_key_id = generate_key_id(&signing_key.verifying_key());
        Self {
            signing_key,
            public_key_id,
            metrics: SigningMetrics::default(),
        }
    }

    /// Public verification key, safe to disclose.
    pub fn public_key(&self) -> VerifyingKey {
        public_key_of(&self.signing_key)
    }

    /// Hex-encoded public key as carried in attestations.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().as_bytes())
    }

    /// Stable short identifier of the public key.
    pub fn public_key_id(&self) -> &str {
        &self.public_key_id
    }

    /// Signs the exact `payload` bytes.
    pub fn sign(&self, payload: &[u8]) -> Signature {
        let signature = sign(&self.signing_key, payload);
        self.metrics
            .payloads_signed_total
            .fetch_add(1, Ordering::Relaxed);
        signature
    }

    pub fn metrics(&self) -> &SigningMetrics {
        &self.metrics
    }
}

impl fmt::Debug for PayloadSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadSigner")
            .field("public_key_id", &self.public_key_id)
            .finish_non_exhaustive()
    }
}

/// Fresh random secret key bytes. Callers are responsible for zeroizing.
pub fn generate_secret_key() -> [u8; SECRET_KEY_LEN] {
    use rand::RngCore;
    let mut bytes = [0u8; SECRET_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generates a stable public key identifier from a verifying key.
fn generate_key_id(verifying_key: &VerifyingKey) -> String {
    let hash = blake3::hash(verifying_key.as_bytes());
    // Use first 16 bytes as hex string
    hex::encode(&hash.as_bytes()[..16])
}

/// Sign `bytes` with `signing_key`.
pub fn sign(signing_key: &SigningKey, bytes: &[u8]) -> Signature {
    signing_key.sign(bytes)
}

/// Public key derived from a private key.
pub fn public_key_of(signing_key: &SigningKey) -> VerifyingKey {
    signing_key.verifying_key()
}

/// Check `signature` over `bytes` against `public_key`.
pub fn verify_signature(public_key: &VerifyingKey, bytes: &[u8], signature: &Signature) -> bool {
    public_key.verify(bytes, signature).is_ok()
}

/// Verify hex-encoded wire values.
///
/// Returns an encoding error for undecodable input and
/// [`CryptoError::BadSignature`] when decoding succeeds but the signature
/// does not verify.
pub fn verify_signature_hex(
    public_key_hex: &str,
    bytes: &[u8],
    signature_hex: &str,
) -> CryptoResult<()> {
    let public_key = decode_public_key(public_key_hex)?;
    let signature = decode_signature(signature_hex)?;
    if verify_signature(&public_key, bytes, &signature) {
        Ok(())
    } else {
        Err(CryptoError::BadSignature)
    }
}

/// Decode a hex-encoded Ed25519 public key.
pub fn decode_public_key(public_key_hex: &str) -> CryptoResult<VerifyingKey> {
    let raw = hex::decode(public_key_hex)?;
    let array: [u8; 32] = raw.as_slice().try_into().map_err(|_| CryptoError::Encoding {
        reason: format!("public key must be 32 bytes, got {}", raw.len()),
    })?;
    VerifyingKey::from_bytes(&array).map_err(|e| CryptoError::CryptoError {
        reason: e.to_string(),
    })
}

/// Decode a hex-encoded Ed25519 signature.
pub fn decode_signature(signature_hex: &str) -> CryptoResult<Signature> {
    let raw = hex::decode(signature_hex)?;
    Signature::from_slice(&raw).map_err(|e| CryptoError::Encoding {
        reason: e.to_string(),
    })
}
