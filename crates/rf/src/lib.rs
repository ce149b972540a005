//! Free-space RF propagation model for the simulated beacon channel.
//!
//! Only used to decide whether an out-of-band beacon is heard; the
//! authenticated attestation path never depends on it.

pub mod signal;

pub use signal::{compute_received_signal, free_space_path_loss, is_receivable, Signal};
