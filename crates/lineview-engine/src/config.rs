//! Configuration types for lineview.
//!
//! The config file is JSON; every field has a default so partial files
//! load cleanly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding lineview's config and log files.
pub const CONFIG_DIR: &str = ".lineview";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Main configuration for lineview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the lineage server's REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL of the lineage web UI, used for row navigation.
    #[serde(default = "default_ui_base_url")]
    pub ui_base_url: String,

    /// Rows requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Command used to open navigation URLs; the URL is appended.
    ///
    /// Empty means URLs are only shown, not opened.
    #[serde(default)]
    pub open_command: Vec<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Event loop tick interval in milliseconds.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,

    /// Log file used while the dashboard owns the terminal.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_api_url() -> String {
    "http://localhost:8080/consumer".into()
}

fn default_ui_base_url() -> String {
    "http://localhost:9090".into()
}

fn default_page_size() -> u64 {
    10
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_tick_rate_ms() -> u64 {
    250
}

fn default_log_file() -> PathBuf {
    Path::new(CONFIG_DIR).join("lineview.log")
}

impl Config {
    /// Default config location, relative to the working directory.
    pub fn default_path() -> PathBuf {
        Path::new(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }

    /// Page size, never zero.
    pub fn page_size(&self) -> u64 {
        self.page_size.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ui_base_url: default_ui_base_url(),
            page_size: default_page_size(),
            open_command: Vec::new(),
            request_timeout_seconds: default_request_timeout_seconds(),
            tick_rate_ms: default_tick_rate_ms(),
            log_file: default_log_file(),
        }
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.page_size, 10);
        assert!(config.open_command.is_empty());
        assert_eq!(config.log_file, PathBuf::from(".lineview/lineview.log"));
        assert_eq!(Config::default_path(), PathBuf::from(".lineview/config.json"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"page_size": 25}"#).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.api_url, default_api_url());
        assert_eq!(config.tick_rate_ms, 250);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            api_url: "http://lineage:8080/api".into(),
            open_command: vec!["open".into()],
            ..Default::default()
        };

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_or_default(&temp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ nope").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = Config {
            page_size: 0,
            request_timeout_seconds: 0,
            tick_rate_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.page_size(), 1);
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
        assert_eq!(config.tick_rate(), Duration::from_millis(10));
    }
}
