//! Error types for sitesync.

use thiserror::Error;

/// Errors produced by the offline queue, its storage and the backend client.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Local database failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The acting user or organization could not be resolved.
    #[error("Identity error: {0}")]
    Identity(String),

    /// The backend could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend rejected a request.
    #[error("Backend rejected request ({status}): {message}")]
    Backend {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error body or reason phrase.
        message: String,
    },

    /// A queued payload does not match what its entity handler expects.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// No handler is registered for the entity type.
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the failure is likely to go away on a later attempt.
    ///
    /// Used for reporting only; every failed action stays queued either way.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Io(_) | Self::Database(_) => true,
            Self::Backend { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::Config(_)
            | Self::Identity(_)
            | Self::InvalidPayload(_)
            | Self::UnknownEntity(_)
            | Self::Parse(_) => false,
        }
    }
}
