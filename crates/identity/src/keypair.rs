//! Witness signing identity.

use ed25519_dalek::{Signature, VerifyingKey};
use mirrorwitness_crypto::PayloadSigner;

/// A witness's persistent signing identity.
///
/// The private key lives inside the signer and is never exported; only the
/// verifying key is disclosed.
#[derive(Debug)]
pub struct WitnessKeypair {
    witness_id: u32,
    signer: PayloadSigner,
}

impl WitnessKeypair {
    pub(crate) fn new(witness_id: u32, signer: PayloadSigner) -> Self {
        Self { witness_id, signer }
    }

    pub fn witness_id(&self) -> u32 {
        self.witness_id
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signer.public_key()
    }

    /// Hex-encoded verifying key.
    pub fn public_key_hex(&self) -> String {
        self.signer.public_key_hex()
    }

    /// Sign the exact payload bytes.
    pub fn sign(&self, payload: &[u8]) -> Signature {
        self.signer.sign(payload)
    }

    pub fn signer(&self) -> &PayloadSigner {
        &self.signer
    }
}
