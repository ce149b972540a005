//! Input and output types for constraint proofs.

use mirrorwitness_core::Observation;
use serde::{Deserialize, Serialize};

/// Circuit identifier of the default altitude ceiling check.
pub const ALTITUDE_CIRCUIT_ID: &str = "altitude_check_v1";

/// Default altitude ceiling in meters.
pub const DEFAULT_MAX_ALTITUDE: f64 = 120.0;

/// Numeric observation field the predicate is evaluated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckedField {
    Altitude,
    Latitude,
    Longitude,
}

impl CheckedField {
    pub fn extract(&self, observation: &Observation) -> f64 {
        match self {
            Self::Altitude => observation.altitude,
            Self::Latitude => observation.latitude,
            Self::Longitude => observation.longitude,
        }
    }
}

/// Predicate configuration: `max(field) <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub circuit_id: String,
    pub field: CheckedField,
    pub threshold: f64,
}

impl ThresholdConfig {
    /// The altitude ceiling check with the given limit.
    pub fn altitude(threshold: f64) -> Self {
        Self {
            circuit_id: ALTITUDE_CIRCUIT_ID.to_string(),
            field: CheckedField::Altitude,
            threshold,
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::altitude(DEFAULT_MAX_ALTITUDE)
    }
}

/// Public inputs to the proof (known to verifier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicInputs {
    pub threshold: f64,
    pub num_points: usize,
}

/// Aggregate statistics of the checked field, disclosed alongside the proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

impl AggregateStats {
    /// Statistics over a non-empty slice of finite values.
    pub(crate) fn from_values(values: &[f64]) -> Option<Self> {
        let (first, rest) = values.split_first()?;
        let (mut max, mut min, mut sum) = (*first, *first, *first);
        for v in rest {
            max = max.max(*v);
            min = min.min(*v);
            sum += v;
        }
        Some(Self {
            max,
            min,
            mean: sum / values.len() as f64,
        })
    }
}
