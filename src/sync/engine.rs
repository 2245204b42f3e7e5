//! Sync engine.
//!
//! Drains the queue against the backend one action at a time, in FIFO
//! order. Each action is audited and then applied; a failure is recorded on
//! the action and the pass moves on. A successful action is removed from the
//! durable queue as soon as it is applied, so a crash mid-pass can resend at
//! most the action that was in flight.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::action::QueuedAction;
use super::connectivity::ConnectivityMonitor;
use super::dispatcher::EntityDispatcher;
use super::identity::{resolve_context, ActingContext, IdentityProvider};
use super::store::QueueStore;
use crate::backend::{AuditEntry, Backend};
use crate::error::SyncError;

/// Why a flush did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Offline,
    InProgress,
    Empty,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Offline => "offline",
            Self::InProgress => "a sync pass is already running",
            Self::Empty => "queue is empty",
        };
        f.write_str(s)
    }
}

/// Result of one pass over the queue.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Applied actions, with `synced_at` set
    pub applied: Vec<QueuedAction>,
    /// Actions kept in the queue, with `error_message` set
    pub failed: Vec<QueuedAction>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            applied: Vec::new(),
            failed: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.applied.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.applied.len() + self.failed.len()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What a call to [`SyncEngine::flush`] did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlushOutcome {
    /// Nothing was attempted.
    Skipped { reason: SkipReason },
    /// The pass stopped before touching any action.
    Aborted { reason: String },
    /// Every action of the snapshot was attempted.
    Completed(SyncReport),
}

impl FlushOutcome {
    #[must_use]
    pub const fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped { .. } | Self::Aborted { .. } => None,
        }
    }
}

/// Keeps the `syncing` status raised for the lifetime of a pass.
struct SyncingFlag<'a>(&'a QueueStore);

impl<'a> SyncingFlag<'a> {
    fn raise(store: &'a QueueStore) -> Self {
        store.set_syncing(true);
        Self(store)
    }
}

impl Drop for SyncingFlag<'_> {
    fn drop(&mut self) {
        self.0.set_syncing(false);
    }
}

/// Drains the offline queue.
pub struct SyncEngine {
    store: Arc<QueueStore>,
    connectivity: ConnectivityMonitor,
    identity: Arc<dyn IdentityProvider>,
    dispatcher: Arc<EntityDispatcher>,
    backend: Arc<dyn Backend>,
    pass: Mutex<()>,
}

impl SyncEngine {
    #[must_use]
    pub fn new(
        store: Arc<QueueStore>,
        connectivity: ConnectivityMonitor,
        identity: Arc<dyn IdentityProvider>,
        dispatcher: Arc<EntityDispatcher>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            store,
            connectivity,
            identity,
            dispatcher,
            backend,
            pass: Mutex::new(()),
        }
    }

    /// Run one pass over the queue.
    ///
    /// Only one pass runs at a time; a call made while another pass holds
    /// the lock returns [`SkipReason::InProgress`]. The pass works on the
    /// queue as it was when it started; actions enqueued meanwhile wait for
    /// the next flush.
    pub async fn flush(&self) -> FlushOutcome {
        if !self.connectivity.is_online() {
            debug!("flush skipped: offline");
            return FlushOutcome::Skipped {
                reason: SkipReason::Offline,
            };
        }

        let Ok(_pass) = self.pass.try_lock() else {
            debug!("flush skipped: pass in progress");
            return FlushOutcome::Skipped {
                reason: SkipReason::InProgress,
            };
        };

        let snapshot = match self.store.load() {
            Ok(actions) => actions,
            Err(error) => {
                error!(%error, "cannot read queue");
                return FlushOutcome::Aborted {
                    reason: error.to_string(),
                };
            },
        };

        if snapshot.is_empty() {
            return FlushOutcome::Skipped {
                reason: SkipReason::Empty,
            };
        }

        let _syncing = SyncingFlag::raise(&self.store);

        let ctx = match resolve_context(self.identity.as_ref()).await {
            Ok(ctx) => ctx,
            Err(error) => {
                warn!(%error, pending = snapshot.len(), "sync pass aborted");
                return FlushOutcome::Aborted {
                    reason: error.to_string(),
                };
            },
        };

        info!(pending = snapshot.len(), user = %ctx.user_id, "sync pass started");
        let mut report = SyncReport::start();

        for mut action in snapshot {
            match self.apply_one(&action, &ctx).await {
                Ok(()) => {
                    action.mark_synced(Utc::now());
                    debug!(action_id = %action.id, entity_type = %action.entity_type, "applied");
                    if let Err(error) = self.store.remove(action.id) {
                        error!(%error, action_id = %action.id, "applied action stays queued and will be resent");
                    }
                    report.applied.push(action);
                },
                Err(error) => {
                    let message = error.to_string();
                    warn!(
                        action_id = %action.id,
                        entity_type = %action.entity_type,
                        transient = error.is_transient(),
                        %message,
                        "action failed, keeping it queued"
                    );
                    action.record_failure(message.as_str());
                    if let Err(error) = self.store.record_failure(action.id, &message) {
                        error!(%error, action_id = %action.id, "cannot persist failure message");
                    }
                    report.failed.push(action);
                },
            }
        }

        report.finished_at = Utc::now();
        info!(
            applied = report.succeeded(),
            failed = report.failed_count(),
            "sync pass finished"
        );
        FlushOutcome::Completed(report)
    }

    /// Audit then apply one action; both must succeed.
    async fn apply_one(&self, action: &QueuedAction, ctx: &ActingContext) -> Result<(), SyncError> {
        let entry = AuditEntry {
            user_id: ctx.user_id.clone(),
            organization_id: ctx.organization_id.clone(),
            resource_type: action.entity_type.clone(),
            resource_id: action.target_id(),
            action: format!("offline_sync.{}", action.action_type),
            details: json!({
                "action_id": action.id,
                "queued_by": action.user_id,
                "queued_at": action.created_at,
                "previous_error": action.error_message,
            }),
        };
        self.backend.record_audit(&entry).await?;
        self.dispatcher.apply(action, ctx).await
    }
}
