//! Path resolution for sitesync configuration and data files.
//!
//! All sitesync data is stored in `~/.sitesync/` unless `SITESYNC_HOME` points
//! somewhere else:
//! - `config.yaml` - Main configuration file
//! - `sitesync.db` - SQLite database holding the offline queue

use std::path::PathBuf;

use crate::error::SyncError;

/// Environment variable overriding the data root.
pub const HOME_ENV: &str = "SITESYNC_HOME";

/// Paths to sitesync configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.sitesync/`
    pub root: PathBuf,
    /// Config file: `~/.sitesync/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.sitesync/sitesync.db`
    pub database: PathBuf,
}

impl Paths {
    /// Resolve paths from `SITESYNC_HOME` or the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn new() -> Result<Self, SyncError> {
        if let Ok(root) = std::env::var(HOME_ENV) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = std::env::var("HOME")
            .map_err(|_| SyncError::Config("Could not determine home directory".to_string()))?;

        Ok(Self::with_root(PathBuf::from(home).join(".sitesync")))
    }

    /// Create paths with a custom root directory (useful for testing).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("sitesync.db"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), SyncError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                SyncError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}
