//! Configuration management for MirrorWitness.
//!
//! Configuration is layered: built-in defaults, an optional TOML file, then
//! `MW_*` environment variables. The shared authentication secret is never
//! given a silent default; see [`Config::require_shared_secret`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{CoreError, CoreResult};

/// Development-only secret, used solely when dev mode is switched on.
pub const DEV_FALLBACK_SECRET: &str = "proof-of-task-secret-2025";

/// First witness port; witness `n` listens on `WITNESS_BASE_PORT + n`.
pub const WITNESS_BASE_PORT: u16 = 8765;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub producer: ProducerConfig,
    pub witness: WitnessConfig,
    pub radio: RadioConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// WebSocket URLs of every witness in the fan-out set
    pub witness_endpoints: Vec<String>,
    pub seal_duration_secs: f64,
    pub sample_period_ms: u64,
    /// Upper bound for connect + send + reply per witness
    pub delivery_timeout_ms: u64,
    /// Attestations wanted per cycle; 0 means best-effort
    pub quorum: usize,
    /// Observations per constraint proof; 0 disables proving
    pub proof_batch: usize,
    pub sink_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WitnessConfig {
    pub witness_id: u32,
    /// Listen address; derived from the witness id when unset
    pub bind_addr: Option<String>,
    /// Directory holding `witness_<id>.key`; `$HOME/.pot` when unset
    pub key_dir: Option<PathBuf>,
    /// Per-witness displacement in degrees, multiplied by the witness id
    pub gps_offset_deg: f64,
    /// Seconds between radio beacons; 0 disables the beacon
    pub beacon_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub frequency_mhz: f64,
    pub power_dbm: f64,
    pub bandwidth_khz: f64,
    pub sensitivity_dbm: f64,
    pub beacon_distance_km: f64,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub shared_secret: Option<String>,
    /// Allows [`DEV_FALLBACK_SECRET`] when no secret is provisioned
    pub dev_mode: bool,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .field("dev_mode", &self.dev_mode)
            .finish()
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            witness_endpoints: (1..=3)
                .map(|id| format!("ws://127.0.0.1:{}", WITNESS_BASE_PORT + id))
                .collect(),
            seal_duration_secs: 300.0,
            sample_period_ms: 1000,
            delivery_timeout_ms: 1000,
            quorum: 0,
            proof_batch: 10,
            sink_attempts: 2,
        }
    }
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            witness_id: 1,
            bind_addr: None,
            key_dir: None,
            gps_offset_deg: 0.001,
            beacon_interval_secs: 0,
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_mhz: 915.0,
            power_dbm: 20.0,
            bandwidth_khz: 125.0,
            sensitivity_dbm: -120.0,
            beacon_distance_km: 2.3,
        }
    }
}

impl WitnessConfig {
    /// Resolved listen address.
    pub fn bind_addr(&self) -> String {
        self.bind_addr.clone().unwrap_or_else(|| {
            let port = WITNESS_BASE_PORT.saturating_add(self.witness_id as u16);
            format!("0.0.0.0:{port}")
        })
    }

    /// Resolved key file path for this witness.
    pub fn key_path(&self) -> CoreResult<PathBuf> {
        let dir = match &self.key_dir {
            Some(dir) => dir.clone(),
            None => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".pot"))
                .ok_or_else(|| {
                    CoreError::Config("HOME is not set and MW_KEY_DIR was not provided".into())
                })?,
        };
        Ok(dir.join(format!("witness_{}.key", self.witness_id)))
    }
}

impl Config {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| {
            CoreError::Config(format!("{}: {}", path.as_ref().display(), e))
        })
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Load defaults or `path`, then overlay the process environment.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut config = match path {
            #[cfg(feature = "toml")]
            Some(path) => Self::from_file(path)?,
            #[cfg(not(feature = "toml"))]
            Some(path) => {
                return Err(CoreError::Config(format!(
                    "{}: built without TOML support",
                    path.display()
                )))
            }
            None => Self::default_config(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the nodes cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.producer.sample_period_ms == 0 {
            return Err(CoreError::Config(
                "sample_period_ms must be greater than zero".into(),
            ));
        }
        if self.producer.delivery_timeout_ms == 0 {
            return Err(CoreError::Config(
                "delivery_timeout_ms must be greater than zero".into(),
            ));
        }
        let seal = self.producer.seal_duration_secs;
        if !seal.is_finite() || seal < 0.0 {
            return Err(CoreError::Config(
                "seal_duration_secs must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Overlay `MW_*` variables from the process environment.
    pub fn apply_env(&mut self) -> CoreResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay `MW_*` variables using `lookup` as the environment.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("MW_SHARED_SECRET") {
            self.security.shared_secret = Some(secret);
        }
        if let Some(v) = lookup("MW_DEV_MODE") {
            self.security.dev_mode = parse_flag("MW_DEV_MODE", &v)?;
        }
        if let Some(v) = lookup("MW_WITNESS_ENDPOINTS") {
            self.producer.witness_endpoints = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("MW_SEAL_DURATION_SECS") {
            self.producer.seal_duration_secs = parse_var("MW_SEAL_DURATION_SECS", &v)?;
        }
        if let Some(v) = lookup("MW_SAMPLE_PERIOD_MS") {
            self.producer.sample_period_ms = parse_var("MW_SAMPLE_PERIOD_MS", &v)?;
        }
        if let Some(v) = lookup("MW_DELIVERY_TIMEOUT_MS") {
            self.producer.delivery_timeout_ms = parse_var("MW_DELIVERY_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("MW_QUORUM") {
            self.producer.quorum = parse_var("MW_QUORUM", &v)?;
        }
        if let Some(v) = lookup("MW_PROOF_BATCH") {
            self.producer.proof_batch = parse_var("MW_PROOF_BATCH", &v)?;
        }
        if let Some(v) = lookup("MW_WITNESS_ID") {
            self.witness.witness_id = parse_var("MW_WITNESS_ID", &v)?;
        }
        if let Some(v) = lookup("MW_WITNESS_BIND") {
            self.witness.bind_addr = Some(v);
        }
        if let Some(v) = lookup("MW_KEY_DIR") {
            self.witness.key_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("MW_GPS_OFFSET_DEG") {
            self.witness.gps_offset_deg = parse_var("MW_GPS_OFFSET_DEG", &v)?;
        }
        if let Some(v) = lookup("MW_BEACON_INTERVAL_SECS") {
            self.witness.beacon_interval_secs = parse_var("MW_BEACON_INTERVAL_SECS", &v)?;
        }
        Ok(())
    }

    /// The provisioned shared secret.
    ///
    /// Fails with [`CoreError::Config`] when none is set, unless dev mode
    /// is on, in which case the well-known development secret is returned
    /// with a warning.
    pub fn require_shared_secret(&self) -> CoreResult<String> {
        match self.security.shared_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
            _ if self.security.dev_mode => {
                warn!("MW_SHARED_SECRET not set; using development fallback secret");
                Ok(DEV_FALLBACK_SECRET.to_string())
            }
            _ => Err(CoreError::Config(
                "MW_SHARED_SECRET must be set (or enable MW_DEV_MODE for local testing)".into(),
            )),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> CoreResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CoreError::Config(format!("{key}={value:?}: {e}")))
}

fn parse_flag(key: &str, value: &str) -> CoreResult<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "" => Ok(false),
        other => Err(CoreError::Config(format!("{key}={other:?}: expected a boolean"))),
    }
}
