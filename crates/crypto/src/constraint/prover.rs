//! Threshold constraint prover and verifier.

use mirrorwitness_core::Observation;
use serde::{Deserialize, Serialize};

use super::error::{ConstraintError, ConstraintResult};
use super::inputs::{AggregateStats, PublicInputs, ThresholdConfig};

/// Published result of a constraint check over a private batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintProof {
    /// Circuit identifier (e.g., "altitude_check_v1")
    pub circuit: String,
    pub public_inputs: PublicInputs,
    /// BLAKE3 commitment to the canonical serialization of the batch
    pub private_inputs_hash: String,
    pub constraint_satisfied: bool,
    pub stats: AggregateStats,
    /// BLAKE3 over circuit, public inputs, commitment and result
    pub proof_digest: String,
}

/// Field subset the digest is computed over, in fixed order.
#[derive(Serialize)]
struct DigestPreimage<'a> {
    circuit: &'a str,
    public_inputs: &'a PublicInputs,
    private_inputs_hash: &'a str,
    constraint_satisfied: bool,
}

impl ConstraintProof {
    /// Recompute the digest from the embedded fields.
    pub fn recompute_digest(&self) -> ConstraintResult<String> {
        proof_digest(
            &self.circuit,
            &self.public_inputs,
            &self.private_inputs_hash,
            self.constraint_satisfied,
        )
    }

    /// Whether the embedded digest still matches the embedded fields.
    pub fn digest_matches(&self) -> bool {
        self.recompute_digest()
            .map(|digest| digest == self.proof_digest)
            .unwrap_or(false)
    }

    /// Whether `batch` is the batch this proof committed to.
    pub fn commits_to(&self, batch: &[Observation]) -> bool {
        commit_batch(batch)
            .map(|commitment| commitment == self.private_inputs_hash)
            .unwrap_or(false)
    }

    /// Compact form submitted on-chain.
    pub fn to_chain_submission(&self) -> ChainSubmission {
        ChainSubmission {
            proof_hash: format!("0x{}", &self.proof_digest[..16.min(self.proof_digest.len())]),
            max_value: self.stats.max,
            verified: self.constraint_satisfied,
        }
    }
}

/// On-chain proof record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSubmission {
    pub proof_hash: String,
    pub max_value: f64,
    pub verified: bool,
}

/// Trait for constraint proving (dependency injection)
pub trait ConstraintProver: Send + Sync {
    /// Evaluate the predicate over a non-empty ordered batch.
    fn prove(&self, observations: &[Observation]) -> ConstraintResult<ConstraintProof>;

    /// Accept or reject a proof.
    fn verify(&self, proof: &ConstraintProof) -> bool;
}

/// Commitment-based prover for `max(field) <= threshold`.
#[derive(Debug, Clone, Default)]
pub struct ThresholdProver {
    config: ThresholdConfig,
}

impl ThresholdProver {
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }
}

impl ConstraintProver for ThresholdProver {
    fn prove(&self, observations: &[Observation]) -> ConstraintResult<ConstraintProof> {
        if observations.is_empty() {
            return Err(ConstraintError::EmptyBatch);
        }
        if !self.config.threshold.is_finite() {
            return Err(ConstraintError::InvalidInput(
                "threshold must be finite".to_string(),
            ));
        }

        let values: Vec<f64> = observations
            .iter()
            .map(|o| self.config.field.extract(o))
            .collect();
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ConstraintError::InvalidInput(format!(
                "observation {i} has a non-finite {:?} value",
                self.config.field
            )));
        }

        let stats = AggregateStats::from_values(&values).ok_or(ConstraintError::EmptyBatch)?;
        let constraint_satisfied = stats.max <= self.config.threshold;

        let public_inputs = PublicInputs {
            threshold: self.config.threshold,
            num_points: observations.len(),
        };
        let private_inputs_hash = commit_batch(observations)?;
        let proof_digest = proof_digest(
            &self.config.circuit_id,
            &public_inputs,
            &private_inputs_hash,
            constraint_satisfied,
        )?;

        tracing::debug!(
            circuit = %self.config.circuit_id,
            num_points = observations.len(),
            max = stats.max,
            constraint_satisfied,
            "Generated constraint proof"
        );

        Ok(ConstraintProof {
            circuit: self.config.circuit_id.clone(),
            public_inputs,
            private_inputs_hash,
            constraint_satisfied,
            stats,
            proof_digest,
        })
    }

    /// Returns the disclosed result. Integrity of the public fields is
    /// checked separately with [`ConstraintProof::digest_matches`].
    fn verify(&self, proof: &ConstraintProof) -> bool {
        proof.constraint_satisfied
    }
}

fn commit_batch(observations: &[Observation]) -> ConstraintResult<String> {
    let canonical = serde_json::to_vec(observations)
        .map_err(|e| ConstraintError::HashError(e.to_string()))?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}

fn proof_digest(
    circuit: &str,
    public_inputs: &PublicInputs,
    private_inputs_hash: &str,
    constraint_satisfied: bool,
) -> ConstraintResult<String> {
    let preimage = DigestPreimage {
        circuit,
        public_inputs,
        private_inputs_hash,
        constraint_satisfied,
    };
    let canonical =
        serde_json::to_vec(&preimage).map_err(|e| ConstraintError::HashError(e.to_string()))?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}
