//! Constraint proofs over observation batches.
//!
//! A public predicate (e.g. "altitude never exceeded 120 m") is evaluated
//! over a private batch of observations. The result is published together
//! with a commitment to the batch and a digest binding both, so later
//! tampering with the public inputs or the result is detectable.
//!
//! This is a disclosed-result commitment, not a zero-knowledge proof: the
//! verifier trusts the prover's arithmetic. A succinct proving backend can
//! be slotted in behind [`ConstraintProver`] without changing the proof
//! data model.

pub mod error;
pub mod inputs;
pub mod prover;

pub use error::{ConstraintError, ConstraintResult};
pub use inputs::{AggregateStats, CheckedField, PublicInputs, ThresholdConfig};
pub use prover::{ChainSubmission, ConstraintProof, ConstraintProver, ThresholdProver};
