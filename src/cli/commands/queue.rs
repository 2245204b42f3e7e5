//! Offline queue commands.

use serde_json::{json, Value};

use crate::cli::args::OutputFormat;
use crate::error::SyncError;
use crate::output::{format_actions, format_outcome, format_queued, format_status, to_json};
use crate::sync::{ActionType, EntityKind, OfflineQueue};

/// Show queue status.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn status(queue: &OfflineQueue, format: OutputFormat) -> Result<String, SyncError> {
    format_status(&queue.status(), queue.is_online(), format)
}

/// List queued actions.
///
/// # Errors
///
/// Returns an error if the queue cannot be read or output formatting fails.
pub fn list(queue: &OfflineQueue, limit: usize, format: OutputFormat) -> Result<String, SyncError> {
    let actions = queue.actions()?;
    format_actions(&actions, limit, format)
}

/// Parse and check a command-line payload.
fn parse_payload(
    kind: EntityKind,
    action_type: ActionType,
    raw: &str,
) -> Result<Value, SyncError> {
    let payload: Value = serde_json::from_str(raw)
        .map_err(|e| SyncError::InvalidPayload(format!("payload is not valid JSON: {e}")))?;
    if !payload.is_object() {
        return Err(SyncError::InvalidPayload(
            "payload must be a JSON object".to_string(),
        ));
    }
    kind.validate(action_type, &payload)?;
    Ok(payload)
}

/// Queue a change.
///
/// # Errors
///
/// Returns an error if the entity, action or payload is invalid, nobody is
/// signed in, or the action cannot be stored.
pub async fn add(
    queue: &OfflineQueue,
    entity: &str,
    action: &str,
    payload: &str,
    format: OutputFormat,
) -> Result<String, SyncError> {
    let kind = EntityKind::from_tag(entity)
        .ok_or_else(|| SyncError::UnknownEntity(entity.to_string()))?;
    let action_type: ActionType = action.parse()?;
    let payload = parse_payload(kind, action_type, payload)?;

    let queued = queue.add_to_queue(kind.tag(), action_type, payload).await?;
    format_queued(&queued, &queue.status(), format)
}

/// Apply queued actions now.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub async fn sync(queue: &OfflineQueue, format: OutputFormat) -> Result<String, SyncError> {
    let outcome = queue.sync_queue().await;
    format_outcome(&outcome, format)
}

/// Drop every queued action.
///
/// # Errors
///
/// Returns `SyncError::Config` without `--force`, or a storage error.
pub fn clear(queue: &OfflineQueue, force: bool, format: OutputFormat) -> Result<String, SyncError> {
    if !force {
        return Err(SyncError::Config(
            "Use --force to drop all queued actions".to_string(),
        ));
    }

    let dropped = queue.queue_length();
    queue.clear_queue()?;

    match format {
        OutputFormat::Json => to_json(&json!({ "cleared": dropped })),
        OutputFormat::Pretty => Ok(format!("Dropped {dropped} queued actions")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::sync::testing::{memory_store, signed_in, RecordingBackend};
    use crate::sync::{ConnectivityMonitor, EntityDispatcher};
    use std::sync::Arc;

    fn offline_queue() -> OfflineQueue {
        let backend: Arc<dyn Backend> = RecordingBackend::new();
        OfflineQueue::new(
            memory_store(),
            ConnectivityMonitor::new(false),
            Arc::new(signed_in()),
            EntityDispatcher::with_defaults(&backend),
            backend,
        )
    }

    #[tokio::test]
    async fn test_add_then_list_json() {
        let queue = offline_queue();

        add(&queue, "ticket", "create", r#"{"title":"Leak"}"#, OutputFormat::Json)
            .await
            .unwrap();
        add(&queue, "message", "delete", r#"{"id":"m-2"}"#, OutputFormat::Json)
            .await
            .unwrap();

        let out: Value = serde_json::from_str(&list(&queue, 20, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(out["count"], 2);
        assert_eq!(out["items"][0]["entity_type"], "ticket");
        assert_eq!(out["items"][1]["action_type"], "DELETE");
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let queue = offline_queue();

        let err = add(&queue, "invoice", "create", "{}", OutputFormat::Pretty)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownEntity(_)));

        let err = add(&queue, "ticket", "archive", "{}", OutputFormat::Pretty)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidPayload(_)));

        let err = add(&queue, "ticket", "create", "[1, 2]", OutputFormat::Pretty)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("JSON object"));

        let err = add(&queue, "ticket", "update", r#"{"title":"x"}"#, OutputFormat::Pretty)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("id"));

        assert_eq!(queue.queue_length(), 0);
    }

    #[tokio::test]
    async fn test_status_json_reports_offline() {
        let queue = offline_queue();
        add(&queue, "ticket", "create", r#"{"title":"Leak"}"#, OutputFormat::Json)
            .await
            .unwrap();

        let out: Value = serde_json::from_str(&status(&queue, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(out["online"], false);
        assert_eq!(out["pending"], 1);
    }

    #[tokio::test]
    async fn test_sync_offline_is_skipped() {
        let queue = offline_queue();
        let out: Value = serde_json::from_str(&sync(&queue, OutputFormat::Json).await.unwrap()).unwrap();
        assert_eq!(out["outcome"], "skipped");
        assert_eq!(out["reason"], "offline");
    }

    #[tokio::test]
    async fn test_clear_requires_force() {
        let queue = offline_queue();
        add(&queue, "ticket", "create", r#"{"title":"Leak"}"#, OutputFormat::Json)
            .await
            .unwrap();

        assert!(clear(&queue, false, OutputFormat::Pretty).is_err());
        assert_eq!(queue.queue_length(), 1);

        assert_eq!(
            clear(&queue, true, OutputFormat::Pretty).unwrap(),
            "Dropped 1 queued actions"
        );
        assert_eq!(queue.queue_length(), 0);
    }
}
