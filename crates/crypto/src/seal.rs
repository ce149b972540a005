//! Sealing and content addressing.
//!
//! A [`SealedArtifact`] binds an [`Observation`] to a validity window and a
//! nonce. Its serialized bytes are the unit everything else refers to: the
//! [`ContentId`] is derived from them, witnesses sign them, and the ledger
//! stores them. Those bytes must therefore be produced once and passed
//! around verbatim, never re-serialized from a parsed copy.

use mirrorwitness_core::Observation;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CryptoError, CryptoResult};

/// Default validity window in seconds.
pub const DEFAULT_SEAL_DURATION_SECS: f64 = 300.0;

/// Length of a content identifier in hex characters (16 digest bytes).
pub const CID_HEX_LEN: usize = 32;

/// An observation bound to a validity window and a nonce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedArtifact {
    #[serde(flatten)]
    pub observation: Observation,
    /// End of the validity window, seconds since the Unix epoch
    pub sealed_until: f64,
    /// Random value distinguishing otherwise identical artifacts
    pub nonce: u64,
}

impl SealedArtifact {
    /// Serialize to the exact bytes that get addressed, signed and stored.
    pub fn to_bytes(&self) -> CryptoResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CryptoError::SerializationError {
            reason: e.to_string(),
        })
    }

    /// Parse and validate artifact bytes received from the wire.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let artifact: Self =
            serde_json::from_slice(bytes).map_err(|e| CryptoError::Malformed {
                reason: e.to_string(),
            })?;
        validate_observation(&artifact.observation)?;
        if !artifact.sealed_until.is_finite() {
            return Err(CryptoError::invalid("sealed_until", "must be finite"));
        }
        Ok(artifact)
    }

    /// Whether the validity window has closed at `now`.
    ///
    /// Consumers should reject expired artifacts; the witness path does not
    /// enforce this.
    pub fn is_expired(&self, now: f64) -> bool {
        now > self.sealed_until
    }
}

/// Seal `observation` for `seal_duration` seconds with the given nonce.
///
/// The window starts at the observation timestamp, so the result is a pure
/// function of its inputs.
pub fn seal(
    observation: &Observation,
    seal_duration: f64,
    nonce: u64,
) -> CryptoResult<SealedArtifact> {
    validate_observation(observation)?;
    if !seal_duration.is_finite() || seal_duration < 0.0 {
        return Err(CryptoError::invalid(
            "seal_duration",
            format!("must be a non-negative finite number, got {seal_duration}"),
        ));
    }

    Ok(SealedArtifact {
        observation: observation.clone(),
        sealed_until: observation.timestamp + seal_duration,
        nonce,
    })
}

/// Seal with a nonce drawn uniformly from the full `u64` range.
pub fn seal_with_random_nonce(
    observation: &Observation,
    seal_duration: f64,
) -> CryptoResult<SealedArtifact> {
    let nonce = rand::thread_rng().gen::<u64>();
    seal(observation, seal_duration, nonce)
}

fn validate_observation(observation: &Observation) -> CryptoResult<()> {
    let numeric = [
        ("timestamp", observation.timestamp),
        ("lat", observation.latitude),
        ("lon", observation.longitude),
        ("alt", observation.altitude),
    ];
    for (field, value) in numeric {
        if !value.is_finite() {
            return Err(CryptoError::invalid(field, "must be finite"));
        }
    }
    if observation.timestamp < 0.0 {
        return Err(CryptoError::invalid("timestamp", "must not be negative"));
    }
    if !(-90.0..=90.0).contains(&observation.latitude) {
        return Err(CryptoError::invalid("lat", "out of range [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&observation.longitude) {
        return Err(CryptoError::invalid("lon", "out of range [-180, 180]"));
    }
    if observation.source.is_empty() {
        return Err(CryptoError::invalid("type", "must not be empty"));
    }
    Ok(())
}

/// Content identifier: truncated BLAKE3 digest of exact artifact bytes.
///
/// Deserialization goes through [`ContentId::parse`], so identifiers read
/// off the wire are always well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Accept an identifier received from the wire.
    pub fn parse(s: &str) -> CryptoResult<Self> {
        if s.len() != CID_HEX_LEN || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(CryptoError::Encoding {
                reason: format!("cid must be {CID_HEX_LEN} lowercase hex characters"),
            });
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..16]
    }
}

impl TryFrom<String> for ContentId {
    type Error = CryptoError;

    fn try_from(s: String) -> CryptoResult<Self> {
        Self::parse(&s)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the content identifier of `bytes`.
pub fn address_of(bytes: &[u8]) -> ContentId {
    let digest = blake3::hash(bytes).to_hex();
    ContentId(digest[..CID_HEX_LEN].to_string())
}

/// Full BLAKE3 hex digest of a payload.
pub fn hash_payload(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
