//! End-to-end tests for the producer/witness attestation protocol
//!
//! This test suite validates:
//! - Sealing, authenticated delivery and witness attestation over real WebSockets
//! - Silent drops of forged, tampered and malformed frames
//! - Best-effort fan-out when witnesses are unreachable or misconfigured
//! - Constraint proofs over observation batches

pub mod test_utils;

#[cfg(test)]
mod attestation_flow_tests;

#[cfg(test)]
mod tamper_tests;

#[cfg(test)]
mod constraint_proof_tests;
