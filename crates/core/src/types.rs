//! Core types

use serde::{Deserialize, Serialize};

/// Source tag used by GPS-derived observations.
pub const GPS_SOURCE_TAG: &str = "gps_data";

/// A single time-bounded geospatial sample.
///
/// Field names on the wire follow the compact GPS record format
/// (`lat`, `lon`, `alt`, `type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// Latitude in degrees
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude in degrees
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// Altitude in meters
    #[serde(rename = "alt")]
    pub altitude: f64,
    /// Source tag of the producing collaborator
    #[serde(rename = "type")]
    pub source: String,
}

impl Observation {
    /// Create a GPS observation.
    pub fn gps(timestamp: f64, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            altitude,
            source: GPS_SOURCE_TAG.to_string(),
        }
    }

    /// Return a copy displaced by the given offsets in degrees.
    pub fn offset_by(&self, d_lat: f64, d_lon: f64) -> Self {
        Self {
            latitude: self.latitude + d_lat,
            longitude: self.longitude + d_lon,
            ..self.clone()
        }
    }
}

/// Current wall clock time in fractional seconds since the Unix epoch.
pub fn unix_time_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
