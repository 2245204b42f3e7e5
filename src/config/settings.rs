//! Configuration settings for sitesync.
//!
//! Settings are loaded from `~/.sitesync/config.yaml`, then overridden by
//! `SITESYNC_*` environment variables.

use serde::{Deserialize, Serialize};

use crate::config::Paths;
use crate::error::SyncError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Backend data API settings.
    pub backend: BackendConfig,
    /// The signed-in actor for this device.
    pub session: SessionConfig,
    /// Queue and sync behaviour.
    pub sync: SyncConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Backend data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the hosted data backend.
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// API key sent with every request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// The signed-in actor for this device.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Authenticated user id.
    pub user_id: Option<String>,
    /// Organization the user acts for.
    pub organization_id: Option<String>,
}

/// Queue and sync behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Attempt a flush right after an enqueue when online.
    #[serde(default = "default_true")]
    pub flush_on_enqueue: bool,
    /// Timeout of the connectivity probe in milliseconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `sitesync=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions for serde
fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_true() -> bool {
    true
}

const fn default_probe_timeout() -> u64 {
    1500
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            flush_on_enqueue: default_true(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default path and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, SyncError> {
        let paths = Paths::new()?;
        let mut config = Self::load_from_path(&paths.config_file)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            SyncError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Override fields from `SITESYNC_*` variables supplied by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SITESYNC_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(key) = lookup("SITESYNC_API_KEY") {
            self.backend.api_key = Some(key);
        }
        if let Some(user) = lookup("SITESYNC_USER_ID") {
            self.session.user_id = Some(user);
        }
        if let Some(org) = lookup("SITESYNC_ORGANIZATION_ID") {
            self.session.organization_id = Some(org);
        }
    }
}
