//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/cspanel/config.toml)
//! 3. Environment variables (CSPANEL_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "CSPANEL";

/// Path of the REST API below the server URL
pub const API_PATH: &str = "/api/v1";

/// Path of the push channel below the server URL
pub const WS_PATH: &str = "/api/v1/ws";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the server manager (scheme, host and port)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Push channel URL; derived from `server_url` when unset
    #[serde(default)]
    pub ws_url: Option<String>,

    /// Delay between reconnect attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Timeout for a single bootstrap request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Number of log entries fetched on bootstrap
    #[serde(default = "default_log_count")]
    pub log_count: usize,

    /// Maximum number of log entries kept in memory
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            ws_url: None,
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            log_count: default_log_count(),
            log_capacity: default_log_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config
            .validate()
            .with_context(|| format!("Invalid configuration: {:?}", path))?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the sync core cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.log_count == 0 {
            bail!("log_count must be at least 1");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_SERVER_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.server_url = val;
            }
        }

        // Empty string clears the override
        if let Ok(val) = std::env::var(format!("{}_WS_URL", ENV_PREFIX)) {
            self.ws_url = if val.is_empty() { None } else { Some(val) };
        }

        if let Some(val) = env_number(&format!("{}_RETRY_DELAY_MS", ENV_PREFIX)) {
            self.retry_delay_ms = val;
        }

        if let Some(val) = env_number(&format!("{}_REQUEST_TIMEOUT_MS", ENV_PREFIX)) {
            self.request_timeout_ms = val;
        }

        if let Some(val) = env_number(&format!("{}_LOG_COUNT", ENV_PREFIX)) {
            self.log_count = val;
        }

        if let Some(val) = env_number(&format!("{}_LOG_CAPACITY", ENV_PREFIX)) {
            self.log_capacity = val;
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with CSPANEL_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cspanel")
            .join("config.toml")
    }

    /// Base URL of the REST API
    pub fn api_base(&self) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), API_PATH)
    }

    /// URL of the push channel
    ///
    /// `http` maps to `ws` and `https` to `wss` unless `ws_url` is set.
    pub fn push_url(&self) -> String {
        if let Some(ref url) = self.ws_url {
            return url.clone();
        }

        let base = self.server_url.trim_end_matches('/');
        let host = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if base.starts_with("ws://") || base.starts_with("wss://") {
            base.to_string()
        } else {
            format!("ws://{}", base)
        };
        format!("{}{}", host, WS_PATH)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.trim().parse().ok())
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_request_timeout_ms() -> u64 {
    8_000
}

fn default_log_count() -> usize {
    500
}

// Matches the server's own in-memory log history
fn default_log_capacity() -> usize {
    1_000
}
