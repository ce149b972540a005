//! Core functionality for the MirrorWitness attestation system.
//!
//! This crate provides the shared observation types, configuration,
//! logging setup and the collaborator traits (telemetry source, ledger
//! sink) used by the producer and witness nodes.

pub mod config;
pub mod error;
pub mod logging;
pub mod sink;
pub mod telemetry;
pub mod types;

pub use config::{Config, ProducerConfig, RadioConfig, SecurityConfig, WitnessConfig};
pub use error::{CoreError, CoreResult};
pub use sink::{
    with_retry, CommitConfirmation, LedgerSink, SimulatedLedger, StorageReceipt,
    DEFAULT_LEDGER_RETENTION,
};
pub use telemetry::{DroneSimulator, TelemetrySource};
pub use types::{unix_time_secs, Observation, GPS_SOURCE_TAG};
