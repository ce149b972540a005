//! Identity management for MirrorWitness witnesses.
//!
//! Each witness owns a persistent, self-issued Ed25519 identity stored in a
//! local key file. The identity is created once on first start and loaded
//! unchanged afterwards; there is no certificate authority and no rotation.
//!
//! # Security Model
//!
//! - Private keys are never transmitted and never logged
//! - Key files are created exclusively with owner-only permissions
//! - A corrupt or unreadable key file aborts startup instead of
//!   silently minting a new identity

pub mod error;
pub mod keypair;
pub mod keystore;

pub use error::{IdentityError, IdentityResult};
pub use keypair::WitnessKeypair;
pub use keystore::load_or_create;
