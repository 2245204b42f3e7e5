//! Hosted data backend.
//!
//! The queue needs two kinds of writes: row mutations on entity tables and
//! audit log entries. Both go through the [`Backend`] trait so the sync
//! engine can be driven against fakes in tests.

mod rest;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::SyncError;
use crate::sync::{ActionId, OrganizationId, UserId};

pub use rest::RestBackend;

/// Table receiving audit entries.
pub const AUDIT_TABLE: &str = "audit_logs";

/// One audit log row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    /// Entity type of the audited action
    pub resource_type: String,
    /// Target row, when the action has one
    pub resource_id: Option<String>,
    /// e.g. `offline_sync.CREATE`
    pub action: String,
    pub details: Value,
}

/// Write access to the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Insert `row` into `table`.
    async fn insert(&self, table: &str, row: &Value, dedup: ActionId) -> Result<(), SyncError>;

    /// Update the row of `table` whose id is `id`.
    async fn update(
        &self,
        table: &str,
        id: &str,
        row: &Value,
        dedup: ActionId,
    ) -> Result<(), SyncError>;

    /// Delete the row of `table` whose id is `id`.
    async fn delete(&self, table: &str, id: &str, dedup: ActionId) -> Result<(), SyncError>;

    /// Append an entry to the audit log.
    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), SyncError>;
}
