// Config module - Shell configuration with persistent JSON storage

use crate::error::ConfigError;
use crate::platform;
use crate::view::BrowserOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the default server URL (for testing/dev)
pub const URL_ENV_VAR: &str = "HA_SHELL_URL";

/// Main shell configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Pre-filled into the form when no address has been saved yet
    pub default_url: String,
    /// Outer deadline for one attempt, armed at submit
    pub connection_timeout_ms: u64,
    /// Client-side timeout of the reachability probe
    pub probe_timeout_ms: u64,
    /// Automatic retries after a failed attempt
    pub max_retries: u32,
    /// Fixed delay before an automatic retry
    pub retry_delay_ms: u64,
    /// How long transient status banners stay up
    pub status_banner_ms: u64,
    /// Start connecting to the saved address on launch
    pub auto_connect: bool,
    /// Flags for the embedded view
    pub browser: BrowserOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_url: "http://homeassistant.local:8123".to_string(),
            connection_timeout_ms: 10_000,
            probe_timeout_ms: 5_000,
            max_retries: 3,
            retry_delay_ms: 2_000,
            status_banner_ms: 3_000,
            auto_connect: false,
            browser: BrowserOptions::default(),
        }
    }
}

impl AppConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn status_banner_duration(&self) -> Duration {
        Duration::from_millis(self.status_banner_ms)
    }
}

/// Load configuration from the platform config dir, applying env overrides.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&platform::config_path())?;
    if let Ok(url) = std::env::var(URL_ENV_VAR) {
        if !url.trim().is_empty() {
            config.default_url = url;
        }
    }
    Ok(config)
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Save configuration to `path`, creating parent directories.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.connection_timeout(), Duration::from_secs(10));
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.status_banner_duration(), Duration::from_secs(3));
        assert!(!config.auto_connect);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_retries": 5, "auto_connect": true}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.max_retries, 5);
        assert!(config.auto_connect);
        assert_eq!(config.connection_timeout_ms, 10_000);
        assert_eq!(config.browser, BrowserOptions::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");
        let config = AppConfig {
            default_url: "https://myha.duckdns.org:8123".into(),
            retry_delay_ms: 500,
            ..Default::default()
        };

        save_config_to(&path, &config).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Json(_))));
    }
}
