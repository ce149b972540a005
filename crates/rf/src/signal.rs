//! RF signal types

use serde::{Deserialize, Serialize};

/// FSPL constant for distance in km and frequency in MHz.
const FSPL_CONSTANT_DB: f64 = 32.45;

/// Free-space path loss in dB.
///
/// Non-positive distances are treated as no loss.
pub fn free_space_path_loss(distance_km: f64, frequency_mhz: f64) -> f64 {
    if distance_km <= 0.0 || frequency_mhz <= 0.0 {
        return 0.0;
    }
    let loss = FSPL_CONSTANT_DB + 20.0 * distance_km.log10() + 20.0 * frequency_mhz.log10();
    // Near-field distances would otherwise yield a gain
    loss.max(0.0)
}

/// Received signal strength in dBm, rounded to 0.1 dB.
///
/// At zero distance the transmit power is received unchanged.
pub fn compute_received_signal(tx_power_dbm: f64, distance_km: f64, frequency_mhz: f64) -> f64 {
    let received = tx_power_dbm - free_space_path_loss(distance_km, frequency_mhz);
    (received * 10.0).round() / 10.0
}

/// Whether a signal at `signal_dbm` is at or above the receiver sensitivity.
pub fn is_receivable(signal_dbm: f64, sensitivity_dbm: f64) -> bool {
    signal_dbm >= sensitivity_dbm
}

/// RF Signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Carrier frequency in MHz
    pub frequency_mhz: f64,
    /// Transmit power in dBm
    pub tx_power_dbm: f64,
    /// Link distance in km
    pub distance_km: f64,
    /// Received strength in dBm
    pub rssi_dbm: f64,
}

impl Signal {
    /// Propagate a transmission over `distance_km` of free space.
    pub fn propagate(tx_power_dbm: f64, distance_km: f64, frequency_mhz: f64) -> Self {
        Self {
            frequency_mhz,
            tx_power_dbm,
            distance_km,
            rssi_dbm: compute_received_signal(tx_power_dbm, distance_km, frequency_mhz),
        }
    }

    pub fn is_receivable(&self, sensitivity_dbm: f64) -> bool {
        is_receivable(self.rssi_dbm, sensitivity_dbm)
    }
}
