//! Periodic witness availability beacon.

use mirrorwitness_core::{unix_time_secs, CoreResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::radio::{RadioPacket, VirtualRadio};

/// Wire `type` of a beacon.
pub const BEACON_TYPE: &str = "witness_beacon";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessBeacon {
    #[serde(rename = "type")]
    pub beacon_type: String,
    pub witness_id: u32,
    pub timestamp: f64,
    pub status: String,
}

impl WitnessBeacon {
    pub fn ready(witness_id: u32) -> Self {
        Self {
            beacon_type: BEACON_TYPE.to_string(),
            witness_id,
            timestamp: unix_time_secs(),
            status: "ready".to_string(),
        }
    }

    pub fn to_payload(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a beacon carried by `packet`, if it holds one.
    pub fn from_packet(packet: &RadioPacket) -> Option<Self> {
        let bytes = packet.payload_bytes()?;
        serde_json::from_slice::<Self>(&bytes)
            .ok()
            .filter(|beacon| beacon.beacon_type == BEACON_TYPE)
    }

    /// Encode and transmit this beacon.
    pub fn transmit(&self, radio: &VirtualRadio, distance_km: f64) -> CoreResult<RadioPacket> {
        Ok(radio.broadcast(&self.to_payload()?, distance_km))
    }
}

/// Broadcast a ready beacon every `interval` until the task is dropped.
pub async fn run_beacon(
    radio: VirtualRadio,
    witness_id: u32,
    interval: Duration,
    distance_km: f64,
) {
    info!(
        witness_id,
        channel = %radio.channel(),
        interval_secs = interval.as_secs(),
        "Beacon mode active"
    );

    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match WitnessBeacon::ready(witness_id).transmit(&radio, distance_km) {
            Ok(packet) => info!(witness_id, rssi_dbm = packet.rssi_dbm, "Beacon sent"),
            Err(e) => warn!(witness_id, error = %e, "Beacon failed"),
        }
    }
}
