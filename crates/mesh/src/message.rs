//! Wire messages exchanged between the producer and witnesses.
//!
//! Every frame is a UTF-8 JSON object tagged by `type`. The authentication
//! tag of a task covers the canonical serialization of every other field,
//! `type` included, in the fixed order `type, payload, cid, timestamp`.

use mirrorwitness_crypto::{auth, hash_payload, signing, ContentId, SharedSecret};
use mirrorwitness_identity::WitnessKeypair;
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};

/// Wire `type` of a producer task.
pub const NEW_TASK_TYPE: &str = "new_task";

/// Frames carried over a producer↔witness connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    /// Sealed artifact broadcast by the producer
    #[serde(rename = "new_task")]
    NewTask(AuthenticatedMessage),

    /// Witness attestation sent back to the producer
    #[serde(rename = "witness_signature")]
    WitnessSignature(SignedAttestation),
}

impl WireMessage {
    pub fn to_json(&self) -> MeshResult<String> {
        serde_json::to_string(self).map_err(|e| MeshError::Decode(e.to_string()))
    }

    pub fn from_json(text: &str) -> MeshResult<Self> {
        serde_json::from_str(text).map_err(|e| MeshError::Decode(e.to_string()))
    }
}

/// A sealed artifact with its content identifier and authentication tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedMessage {
    /// Hex-encoded raw artifact bytes
    pub payload: String,
    pub cid: ContentId,
    /// Send time, seconds since the Unix epoch
    pub timestamp: f64,
    /// Hex-encoded HMAC-SHA256 tag
    pub hmac: String,
}

#[derive(Serialize)]
struct CanonicalTask<'a> {
    #[serde(rename = "type")]
    message_type: &'static str,
    payload: &'a str,
    cid: &'a ContentId,
    timestamp: f64,
}

impl AuthenticatedMessage {
    /// Wrap raw artifact bytes and tag them under `secret`.
    pub fn new(
        secret: &SharedSecret,
        payload: &[u8],
        cid: ContentId,
        timestamp: f64,
    ) -> MeshResult<Self> {
        let mut message = Self {
            payload: hex::encode(payload),
            cid,
            timestamp,
            hmac: String::new(),
        };
        let canonical = message.canonical_bytes()?;
        message.hmac = auth::tag(secret, &canonical).to_hex();
        Ok(message)
    }

    /// Bytes the tag is computed over.
    pub fn canonical_bytes(&self) -> MeshResult<Vec<u8>> {
        serde_json::to_vec(&CanonicalTask {
            message_type: NEW_TASK_TYPE,
            payload: &self.payload,
            cid: &self.cid,
            timestamp: self.timestamp,
        })
        .map_err(|e| MeshError::Decode(e.to_string()))
    }

    /// Recompute the tag and compare in constant time.
    pub fn authenticate(&self, secret: &SharedSecret) -> MeshResult<()> {
        let canonical = self.canonical_bytes()?;
        if auth::verify_hex(secret, &canonical, &self.hmac) {
            Ok(())
        } else {
            Err(MeshError::Authentication)
        }
    }

    /// Raw artifact bytes.
    pub fn decode_payload(&self) -> MeshResult<Vec<u8>> {
        hex::decode(&self.payload).map_err(|e| MeshError::Decode(format!("payload: {e}")))
    }
}

/// A witness's signed statement over a sealed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAttestation {
    pub witness_id: u32,
    /// Hex-encoded Ed25519 verifying key
    pub pubkey: String,
    /// Hex-encoded Ed25519 signature over the raw payload bytes
    pub signature: String,
    /// BLAKE3 hex digest of the raw payload bytes
    pub payload_hash: String,
    pub cid: ContentId,
}

impl SignedAttestation {
    /// Hash and sign the exact `payload` bytes.
    pub fn create(keypair: &WitnessKeypair, payload: &[u8], cid: ContentId) -> Self {
        let payload_hash = hash_payload(payload);
        let signature = keypair.sign(payload);
        Self {
            witness_id: keypair.witness_id(),
            pubkey: keypair.public_key_hex(),
            signature: hex::encode(signature.to_bytes()),
            payload_hash,
            cid,
        }
    }

    /// Check the hash and signature against the bytes that were sent.
    pub fn verify(&self, payload: &[u8]) -> MeshResult<()> {
        if self.payload_hash != hash_payload(payload) {
            return Err(MeshError::AttestationRejected(format!(
                "payload hash mismatch from witness {}",
                self.witness_id
            )));
        }
        signing::verify_signature_hex(&self.pubkey, payload, &self.signature).map_err(|e| {
            MeshError::AttestationRejected(format!("witness {}: {}", self.witness_id, e))
        })
    }

    /// Like [`verify`](Self::verify), also requiring the attestation to name `cid`.
    pub fn verify_for(&self, cid: &ContentId, payload: &[u8]) -> MeshResult<()> {
        if &self.cid != cid {
            return Err(MeshError::AttestationRejected(format!(
                "witness {} attested {} instead of {}",
                self.witness_id, self.cid, cid
            )));
        }
        self.verify(payload)
    }
}
