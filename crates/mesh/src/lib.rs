//! MirrorWitness Mesh - producer and witness nodes of the attestation protocol
//!
//! A single producer seals observations and fans them out over WebSockets
//! to a fixed set of witnesses. Each witness independently authenticates,
//! corroborates and signs what it received and returns an attestation.
//!
//! # Core Components
//!
//! - **Wire Messages**: `new_task` and `witness_signature` JSON frames
//! - **Witness Node**: Per-connection sequential processing, silent drops on bad input
//! - **Producer Node**: Fixed-period cycle with concurrent, deadline-bounded delivery
//! - **Quorum Policy**: k-of-n reporting, never blocking
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use mirrorwitness_crypto::SharedSecret;
//! use mirrorwitness_mesh::{ProducerNode, ProducerSettings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let secret = SharedSecret::new(b"s3cret".to_vec())?;
//! let mut producer = ProducerNode::new(ProducerSettings::default(), secret);
//!
//! let report = producer.run_cycle().await?;
//! println!("{} attested by {} witnesses", report.cid, report.attested_count());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod message;
pub mod producer;
pub mod quorum;
pub mod witness;

pub use error::{MeshError, MeshResult};
pub use message::{AuthenticatedMessage, SignedAttestation, WireMessage, NEW_TASK_TYPE};
pub use producer::{
    broadcast, check_reply, deliver, CycleReport, Delivery, DeliveryOutcome, ProducerNode,
    ProducerSettings, ProducerStage,
};
pub use quorum::QuorumPolicy;
pub use witness::{Corroborator, OffsetCorroborator, WitnessNode, DEFAULT_GPS_OFFSET_DEG};
