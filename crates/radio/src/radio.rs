//! Radio types

use mirrorwitness_core::{unix_time_secs, RadioConfig};
use mirrorwitness_rf::{compute_received_signal, is_receivable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SIMULATED_SNR_DB: f64 = 10.5;
const SPREADING_FACTOR: u8 = 7;
const CODING_RATE: &str = "4/5";

/// One packet as seen on the simulated channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioPacket {
    pub channel: String,
    pub frequency_mhz: f64,
    /// Hex-encoded payload bytes
    pub payload: String,
    pub rssi_dbm: f64,
    pub snr_db: f64,
    pub timestamp: f64,
    pub spreading_factor: u8,
    pub coding_rate: String,
}

impl RadioPacket {
    pub fn payload_bytes(&self) -> Option<Vec<u8>> {
        hex::decode(&self.payload).ok()
    }
}

/// Software-only SX1262-style transceiver.
#[derive(Debug, Clone)]
pub struct VirtualRadio {
    frequency_mhz: f64,
    power_dbm: f64,
    bandwidth_khz: f64,
    sensitivity_dbm: f64,
    channel: String,
}

impl VirtualRadio {
    pub fn new(config: &RadioConfig) -> Self {
        let radio = Self {
            frequency_mhz: config.frequency_mhz,
            power_dbm: config.power_dbm,
            bandwidth_khz: config.bandwidth_khz,
            sensitivity_dbm: config.sensitivity_dbm,
            channel: format!("lora_{}", config.frequency_mhz.trunc() as i64),
        };
        info!(
            channel = %radio.channel,
            frequency_mhz = radio.frequency_mhz,
            power_dbm = radio.power_dbm,
            bandwidth_khz = radio.bandwidth_khz,
            "Virtual radio initialized"
        );
        radio
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn frequency_mhz(&self) -> f64 {
        self.frequency_mhz
    }

    /// Transmit `payload` to a receiver `distance_km` away.
    pub fn broadcast(&self, payload: &[u8], distance_km: f64) -> RadioPacket {
        let rssi_dbm = compute_received_signal(self.power_dbm, distance_km, self.frequency_mhz);
        debug!(
            channel = %self.channel,
            rssi_dbm,
            distance_km,
            bytes = payload.len(),
            "TX"
        );
        RadioPacket {
            channel: self.channel.clone(),
            frequency_mhz: self.frequency_mhz,
            payload: hex::encode(payload),
            rssi_dbm,
            snr_db: SIMULATED_SNR_DB,
            timestamp: unix_time_secs(),
            spreading_factor: SPREADING_FACTOR,
            coding_rate: CODING_RATE.to_string(),
        }
    }

    /// Accept `packet` if it is on this channel and strong enough.
    pub fn receive<'a>(&self, packet: &'a RadioPacket) -> Option<&'a RadioPacket> {
        if packet.channel != self.channel {
            return None;
        }
        if !is_receivable(packet.rssi_dbm, self.sensitivity_dbm) {
            debug!(rssi_dbm = packet.rssi_dbm, "RX failed: signal below sensitivity");
            return None;
        }
        debug!(channel = %self.channel, rssi_dbm = packet.rssi_dbm, "RX");
        Some(packet)
    }
}

impl Default for VirtualRadio {
    fn default() -> Self {
        Self::new(&RadioConfig::default())
    }
}
