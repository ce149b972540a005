//! Attestation quorum policy.
//!
//! A cycle never blocks on the quorum: the producer only reports whether
//! the attestations collected within the delivery timeout met it.

use serde::{Deserialize, Serialize};

/// Minimum number of valid attestations wanted per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    required: usize,
}

impl QuorumPolicy {
    /// Any number of attestations, including none, is acceptable.
    pub fn best_effort() -> Self {
        Self { required: 0 }
    }

    /// At least `k` attestations out of however many witnesses were asked.
    pub fn k_of_n(k: usize) -> Self {
        Self { required: k }
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn is_best_effort(&self) -> bool {
        self.required == 0
    }

    /// Whether `attested` valid attestations out of `total` meet the policy.
    ///
    /// A requirement larger than the witness set can never be met.
    pub fn is_met(&self, attested: usize, total: usize) -> bool {
        if self.required > total {
            return false;
        }
        attested >= self.required
    }
}
