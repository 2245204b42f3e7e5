//! Fakes shared by the sync tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::action::{ActionId, ActionType, QueuedAction, UserId};
use super::store::QueueStore;
use crate::backend::{AuditEntry, Backend};
use crate::config::SessionConfig;
use crate::error::SyncError;
use crate::storage::Database;
use crate::sync::identity::ConfiguredIdentity;

/// A write the fake backend accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub method: &'static str,
    pub table: String,
    pub row: Value,
}

/// Pause point inside an insert.
pub struct Gate {
    pub title: String,
    pub entered: Notify,
    pub release: Notify,
}

/// Backend that records writes and rejects configured titles.
#[derive(Default)]
pub struct RecordingBackend {
    writes: Mutex<Vec<Write>>,
    audits: Mutex<Vec<AuditEntry>>,
    rejected_titles: Mutex<HashSet<String>>,
    audit_down: AtomicBool,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject_title(&self, title: &str) {
        self.rejected_titles.lock().unwrap().insert(title.to_string());
    }

    pub fn accept_title(&self, title: &str) {
        self.rejected_titles.lock().unwrap().remove(title);
    }

    pub fn set_audit_down(&self, down: bool) {
        self.audit_down.store(down, Ordering::SeqCst);
    }

    /// Make the insert of `title` wait until the gate is released.
    pub fn pause_on(&self, title: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate {
            title: title.to_string(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn written_titles(&self) -> Vec<String> {
        self.writes()
            .iter()
            .filter_map(|w| w.row["title"].as_str().map(String::from))
            .collect()
    }

    pub fn audits(&self) -> Vec<AuditEntry> {
        self.audits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn insert(&self, table: &str, row: &Value, _dedup: ActionId) -> Result<(), SyncError> {
        let title = row["title"].as_str().unwrap_or_default().to_string();

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate.filter(|g| g.title == title) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.rejected_titles.lock().unwrap().contains(&title) {
            return Err(SyncError::Backend {
                status: 422,
                message: format!("rejected {title}"),
            });
        }

        self.writes.lock().unwrap().push(Write {
            method: "insert",
            table: table.to_string(),
            row: row.clone(),
        });
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        _id: &str,
        row: &Value,
        _dedup: ActionId,
    ) -> Result<(), SyncError> {
        self.writes.lock().unwrap().push(Write {
            method: "update",
            table: table.to_string(),
            row: row.clone(),
        });
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str, _dedup: ActionId) -> Result<(), SyncError> {
        self.writes.lock().unwrap().push(Write {
            method: "delete",
            table: table.to_string(),
            row: json!({ "id": id }),
        });
        Ok(())
    }

    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), SyncError> {
        if self.audit_down.load(Ordering::SeqCst) {
            return Err(SyncError::Network("audit log unreachable".to_string()));
        }
        self.audits.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

pub fn memory_store() -> Arc<QueueStore> {
    Arc::new(QueueStore::with_database(Database::open_in_memory().unwrap()).unwrap())
}

pub fn signed_in() -> ConfiguredIdentity {
    ConfiguredIdentity::new(SessionConfig {
        user_id: Some("user-1".to_string()),
        organization_id: Some("org-1".to_string()),
    })
}

pub fn ticket(title: &str) -> QueuedAction {
    QueuedAction::new(
        UserId::new("user-1"),
        "ticket",
        ActionType::Create,
        json!({ "title": title }),
    )
}

pub fn titles(actions: &[QueuedAction]) -> Vec<String> {
    actions
        .iter()
        .map(|a| a.payload["title"].as_str().unwrap_or_default().to_string())
        .collect()
}
