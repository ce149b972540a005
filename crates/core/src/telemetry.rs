//! Telemetry collaborators.
//!
//! The producer reads observations through [`TelemetrySource`]. Real
//! deployments wrap a GPS device API; [`DroneSimulator`] is the synthetic
//! source used when no device is present or the device stops answering.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::CoreResult;
use crate::types::{unix_time_secs, Observation};

/// Starting point of the simulated flight (San Francisco).
pub const DEFAULT_ORIGIN: (f64, f64, f64) = (37.7749, -122.4194, 100.0);

/// Degrees moved per sample before jitter.
pub const DEFAULT_STEP_DEG: f64 = 0.0001;

/// Anything that can produce timestamped coordinate samples.
pub trait TelemetrySource: Send {
    /// Obtain the next observation. May fail when the device is unavailable.
    fn observe(&mut self) -> CoreResult<Observation>;
}

/// Random-walk drone used as a synthetic telemetry source.
#[derive(Debug)]
pub struct DroneSimulator {
    lat: f64,
    lon: f64,
    alt: f64,
    step: f64,
    rng: StdRng,
}

impl DroneSimulator {
    /// Start a simulated flight at [`DEFAULT_ORIGIN`].
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Start a reproducible flight.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let (lat, lon, alt) = DEFAULT_ORIGIN;
        Self {
            lat,
            lon,
            alt,
            step: DEFAULT_STEP_DEG,
            rng,
        }
    }

    /// Advance the simulation by one tick and report the position at `timestamp`.
    pub fn step_at(&mut self, timestamp: f64) -> Observation {
        self.lat += self.jitter();
        self.lon += self.jitter();
        self.alt += self.rng.gen_range(-1.0..=1.0);

        Observation::gps(
            timestamp,
            round_to(self.lat, 6),
            round_to(self.lon, 6),
            round_to(self.alt, 2),
        )
    }

    fn jitter(&mut self) -> f64 {
        let magnitude = self.step * self.rng.gen_range(0.5..=1.5);
        if self.rng.gen_bool(0.5) {
            magnitude
        } else {
            -magnitude
        }
    }
}

impl Default for DroneSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for DroneSimulator {
    fn observe(&mut self) -> CoreResult<Observation> {
        Ok(self.step_at(unix_time_secs()))
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
