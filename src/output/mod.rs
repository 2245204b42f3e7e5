//! Output formatting for sitesync.
//!
//! Every command renders either as colored text for people or as JSON for
//! scripts.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::SyncError;
use crate::sync::{FlushOutcome, QueueStatus, QueuedAction};

pub use json::*;
pub use pretty::*;

/// Format queue status based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_status(
    status: &QueueStatus,
    online: bool,
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_status_pretty(status, online)),
        OutputFormat::Json => format_status_json(status, online),
    }
}

/// Format queued actions based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_actions(
    actions: &[QueuedAction],
    limit: usize,
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_actions_pretty(actions, limit)),
        OutputFormat::Json => format_actions_json(actions, limit),
    }
}

/// Format a freshly queued action based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_queued(
    action: &QueuedAction,
    status: &QueueStatus,
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_queued_pretty(action, status)),
        OutputFormat::Json => format_queued_json(action, status),
    }
}

/// Format a flush outcome based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_outcome(outcome: &FlushOutcome, format: OutputFormat) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_outcome_pretty(outcome)),
        OutputFormat::Json => to_json(outcome),
    }
}
