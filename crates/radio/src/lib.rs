//! Virtual LoRa radio used for witness availability beacons.
//!
//! Beacons are informational only: nothing in the attestation protocol
//! depends on whether one was heard.

pub mod beacon;
pub mod radio;

pub use beacon::{run_beacon, WitnessBeacon, BEACON_TYPE};
pub use radio::{RadioPacket, VirtualRadio};
