//! Shared-secret message authentication.
//!
//! Tags are HMAC-SHA256 over caller-supplied canonical bytes. Sender and
//! receiver must canonicalize identically; this module only guarantees that
//! the tag comparison is constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

type HmacSha256 = Hmac<Sha256>;

/// Tag length in bytes.
pub const TAG_LEN: usize = 32;

/// Secret shared out-of-band between the producer and every witness.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Wrap secret bytes. Empty secrets are rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> CryptoResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(CryptoError::invalid("shared_secret", "must not be empty"));
        }
        Ok(Self(bytes))
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC is defined for keys of any length
        <HmacSha256 as Mac>::new_from_slice(&self.0).expect("HMAC accepts keys of any length")
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Authentication tag over a canonical message.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthTag([u8; TAG_LEN]);

impl AuthTag {
    pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for AuthTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthTag({})", self.to_hex())
    }
}

/// Compute the tag of `canonical_bytes` under `secret`.
pub fn tag(secret: &SharedSecret, canonical_bytes: &[u8]) -> AuthTag {
    let mut mac = secret.mac();
    mac.update(canonical_bytes);
    let mut out = [0u8; TAG_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    AuthTag(out)
}

/// Check `tag` against `canonical_bytes` in constant time.
pub fn verify(secret: &SharedSecret, canonical_bytes: &[u8], tag: &[u8]) -> bool {
    let mut mac = secret.mac();
    mac.update(canonical_bytes);
    mac.verify_slice(tag).is_ok()
}

/// Like [`verify`], for a hex-encoded tag as carried on the wire.
///
/// Undecodable tags simply fail verification.
pub fn verify_hex(secret: &SharedSecret, canonical_bytes: &[u8], tag_hex: &str) -> bool {
    match hex::decode(tag_hex) {
        Ok(tag) => verify(secret, canonical_bytes, &tag),
        Err(_) => false,
    }
}
