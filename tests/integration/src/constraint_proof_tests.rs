//! Constraint proofs over altitude batches

use mirrorwitness_core::Observation;
use mirrorwitness_crypto::{
    ConstraintError, ConstraintProver, ThresholdConfig, ThresholdProver,
};

fn batch(altitudes: &[f64]) -> Vec<Observation> {
    altitudes
        .iter()
        .enumerate()
        .map(|(i, alt)| Observation::gps(1000.0 + i as f64, 37.7749, -122.4194, *alt))
        .collect()
}

#[test]
fn test_batch_within_ceiling() {
    let prover = ThresholdProver::new(ThresholdConfig::altitude(120.0));
    let proof = prover.prove(&batch(&[95.3, 102.1, 117.8, 110.5])).unwrap();

    assert!(proof.constraint_satisfied);
    assert!(prover.verify(&proof));
    assert_eq!(proof.stats.max, 117.8);
    assert_eq!(proof.public_inputs.num_points, 4);
    assert_eq!(proof.to_chain_submission().max_value, 117.8);
    assert!(proof.digest_matches());
}

#[test]
fn test_batch_breaking_ceiling() {
    let prover = ThresholdProver::new(ThresholdConfig::altitude(120.0));
    let proof = prover.prove(&batch(&[95.3, 125.7, 118.2])).unwrap();

    assert!(!proof.constraint_satisfied);
    assert!(!prover.verify(&proof));
    assert_eq!(proof.stats.max, 125.7);
    assert!(!proof.to_chain_submission().verified);
}

#[test]
fn test_tampered_flag_breaks_digest() {
    let prover = ThresholdProver::default();
    let mut proof = prover.prove(&batch(&[95.3, 125.7, 118.2])).unwrap();
    proof.constraint_satisfied = true;

    assert!(!proof.digest_matches());
}

#[test]
fn test_commitment_binds_coordinates() {
    let prover = ThresholdProver::default();
    let original = batch(&[95.3, 102.1]);
    let mut moved = original.clone();
    moved[0].latitude += 0.5;

    let a = prover.prove(&original).unwrap();
    let b = prover.prove(&moved).unwrap();

    assert_ne!(a.proof_digest, b.proof_digest);
    assert_eq!(a.constraint_satisfied, b.constraint_satisfied);
    assert!(a.commits_to(&original));
    assert!(!a.commits_to(&moved));
}

#[test]
fn test_empty_batch_is_an_error() {
    let prover = ThresholdProver::default();
    assert_eq!(prover.prove(&[]).unwrap_err(), ConstraintError::EmptyBatch);
}
