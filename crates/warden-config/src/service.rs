//! Validated service configuration

use std::path::PathBuf;
use std::time::Duration;
use warden_api::Settings;
use warden_util::default_data_dir;

use crate::schema::RawConfig;

/// Schemes of internal browser pages and extension pages
pub const DEFAULT_UNTRACKED_SCHEMES: &[&str] =
    &["chrome", "chrome-extension", "about", "edge", "brave"];

/// Validated configuration ready for use by the service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding the store database
    pub data_dir: PathBuf,

    /// Timer cadences
    pub schedule: ScheduleConfig,

    /// Settings written to the store on first run
    pub default_settings: Settings,

    /// URL schemes that are never tracked or blocked
    pub untracked_schemes: Vec<String>,
}

/// Timer cadences for the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub flush_interval: Duration,
    pub sweep_interval: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(5),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            schedule: ScheduleConfig::default(),
            default_settings: Settings::default(),
            untracked_schemes: default_untracked_schemes(),
        }
    }
}

impl ServiceConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let schedule_defaults = ScheduleConfig::default();
        let settings_defaults = Settings::default();

        let schedule = ScheduleConfig {
            flush_interval: raw
                .schedule
                .flush_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(schedule_defaults.flush_interval),
            sweep_interval: raw
                .schedule
                .sweep_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(schedule_defaults.sweep_interval),
        };

        let default_settings = Settings {
            notifications: raw
                .defaults
                .notifications
                .unwrap_or(settings_defaults.notifications),
            warning_threshold: raw
                .defaults
                .warning_threshold
                .unwrap_or(settings_defaults.warning_threshold),
            tracking_enabled: raw
                .defaults
                .tracking_enabled
                .unwrap_or(settings_defaults.tracking_enabled),
        };

        let untracked_schemes = raw
            .domains
            .untracked_schemes
            .map(|schemes| schemes.into_iter().map(|s| s.to_ascii_lowercase()).collect())
            .unwrap_or_else(default_untracked_schemes);

        Self {
            data_dir: raw.service.data_dir.unwrap_or_else(default_data_dir),
            schedule,
            default_settings,
            untracked_schemes,
        }
    }

    /// Path of the store database inside the data directory
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(warden_util::STORE_FILENAME)
    }
}

fn default_untracked_schemes() -> Vec<String> {
    DEFAULT_UNTRACKED_SCHEMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}
