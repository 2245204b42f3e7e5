//! Configuration management for sitesync.
//!
//! This module handles loading configuration from `~/.sitesync/`.

mod paths;
mod settings;

pub use paths::{Paths, HOME_ENV};
pub use settings::{BackendConfig, Config, LoggingConfig, SessionConfig, SyncConfig};
