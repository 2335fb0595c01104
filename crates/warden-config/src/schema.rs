//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Timer cadences
    #[serde(default)]
    pub schedule: RawSchedule,

    /// First-run user settings
    #[serde(default)]
    pub defaults: RawDefaults,

    /// Which addresses are considered trackable
    #[serde(default)]
    pub domains: RawDomains,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store
    pub data_dir: Option<PathBuf>,
}

/// Timer cadences
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSchedule {
    /// How often the open session is flushed (default 60)
    pub flush_interval_seconds: Option<u64>,

    /// How often every open page is re-checked (default 5)
    pub sweep_interval_seconds: Option<u64>,
}

/// Settings written to the store on first run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDefaults {
    pub notifications: Option<bool>,
    pub warning_threshold: Option<f64>,
    pub tracking_enabled: Option<bool>,
}

/// Trackable address rules
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDomains {
    /// URL schemes (without the trailing colon) that are never tracked
    pub untracked_schemes: Option<Vec<String>>,
}
