//! JSON output formatting for sitesync.

use serde::Serialize;
use serde_json::json;

use crate::error::SyncError;
use crate::sync::{QueueStatus, QueuedAction};

/// Format queue status as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_status_json(status: &QueueStatus, online: bool) -> Result<String, SyncError> {
    let output = json!({
        "online": online,
        "pending": status.pending,
        "failing": status.failing,
        "syncing": status.syncing,
        "oldest_pending": status.oldest_pending.map(|t| t.to_rfc3339()),
        "last_error": status.last_error,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format queued actions as JSON
///
/// `count` is the full queue length; `items` holds at most `limit` actions.
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_actions_json(actions: &[QueuedAction], limit: usize) -> Result<String, SyncError> {
    let shown = &actions[..actions.len().min(limit)];
    let output = json!({
        "count": actions.len(),
        "items": shown
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format a freshly queued action as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_queued_json(action: &QueuedAction, status: &QueueStatus) -> Result<String, SyncError> {
    let output = json!({
        "action": action,
        "pending": status.pending,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, SyncError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{ActionType, UserId};
    use serde_json::Value;

    fn action(title: &str) -> QueuedAction {
        QueuedAction::new(
            UserId::new("u-1"),
            "ticket",
            ActionType::Create,
            json!({ "title": title }),
        )
    }

    #[test]
    fn test_status_json() {
        let status = QueueStatus {
            pending: 2,
            failing: 1,
            last_error: Some("boom".to_string()),
            ..QueueStatus::default()
        };

        let out: Value = serde_json::from_str(&format_status_json(&status, false).unwrap()).unwrap();

        assert_eq!(out["online"], false);
        assert_eq!(out["pending"], 2);
        assert_eq!(out["failing"], 1);
        assert_eq!(out["last_error"], "boom");
        assert!(out["oldest_pending"].is_null());
    }

    #[test]
    fn test_actions_json_respects_limit() {
        let actions = vec![action("a"), action("b"), action("c")];

        let out: Value = serde_json::from_str(&format_actions_json(&actions, 2).unwrap()).unwrap();

        assert_eq!(out["count"], 3);
        assert_eq!(out["items"].as_array().unwrap().len(), 2);
        assert_eq!(out["items"][0]["payload"]["title"], "a");
    }
}
