//! Default paths for sitewarden components
//!
//! Paths are user-writable (the service runs as the browser's child process):
//! - Config: `$XDG_CONFIG_HOME/sitewarden/config.toml` or `~/.config/sitewarden/config.toml`
//! - Data: `$XDG_DATA_HOME/sitewarden` or `~/.local/share/sitewarden`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const WARDEN_DATA_DIR_ENV: &str = "WARDEN_DATA_DIR";

/// Environment variable for overriding the config file
pub const WARDEN_CONFIG_ENV: &str = "WARDEN_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "sitewarden";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Store filename within the data directory
pub const STORE_FILENAME: &str = "sitewarden.db";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/sitewarden/config.toml`
/// 2. `~/.config/sitewarden/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$WARDEN_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/sitewarden` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/sitewarden` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(WARDEN_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the WARDEN_DATA_DIR env var.
/// Used for config defaults where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_contains_app_dir() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("sitewarden"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn data_dir_contains_app_dir() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("sitewarden"));
    }
}
