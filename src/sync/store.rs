//! Durable storage of the offline queue.
//!
//! The whole queue is one JSON document stored under [`QUEUE_STORAGE_KEY`].
//! Every mutation is a read-modify-write of that document performed while
//! holding the store's lock, and every write refreshes the [`QueueStatus`]
//! mirror that UI consumers watch.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::action::{ActionId, QueuedAction};
use crate::error::SyncError;
use crate::storage::Database;

/// Key of the queue document in local storage.
pub const QUEUE_STORAGE_KEY: &str = "offline_queue";

/// Version written into the queue document.
pub const QUEUE_FORMAT_VERSION: u32 = 1;

/// In-memory view of the queue for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Actions waiting to be applied
    pub pending: usize,
    /// Pending actions whose last attempt failed
    pub failing: usize,
    /// Whether a sync pass is running
    pub syncing: bool,
    /// Error of the most recently enqueued failing action
    pub last_error: Option<String>,
    /// Enqueue time of the head of the queue
    pub oldest_pending: Option<DateTime<Utc>>,
}

impl QueueStatus {
    fn from_actions(actions: &[QueuedAction], syncing: bool) -> Self {
        Self {
            pending: actions.len(),
            failing: actions.iter().filter(|a| a.has_failed()).count(),
            syncing,
            last_error: actions.iter().rev().find_map(|a| a.error_message.clone()),
            oldest_pending: actions.first().map(|a| a.created_at),
        }
    }
}

#[derive(Serialize)]
struct PersistedQueueRef<'a> {
    version: u32,
    actions: &'a [QueuedAction],
}

#[derive(Deserialize)]
struct PersistedQueue {
    version: u32,
    actions: Vec<QueuedAction>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredQueue {
    Versioned(PersistedQueue),
    // Documents written before the version field existed.
    Unversioned(Vec<QueuedAction>),
}

/// Decode a stored queue document.
///
/// Unreadable documents decode to an empty queue.
#[must_use]
pub fn decode_queue(raw: &str) -> Vec<QueuedAction> {
    match serde_json::from_str::<StoredQueue>(raw) {
        Ok(StoredQueue::Versioned(queue)) => {
            if queue.version > QUEUE_FORMAT_VERSION {
                warn!(
                    version = queue.version,
                    supported = QUEUE_FORMAT_VERSION,
                    "queue document written by a newer version"
                );
            }
            queue.actions
        },
        Ok(StoredQueue::Unversioned(actions)) => {
            debug!(count = actions.len(), "migrating unversioned queue document");
            actions
        },
        Err(error) => {
            warn!(%error, "stored queue is unreadable, treating it as empty");
            Vec::new()
        },
    }
}

/// Encode the queue document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_queue(actions: &[QueuedAction]) -> Result<String, SyncError> {
    Ok(serde_json::to_string(&PersistedQueueRef {
        version: QUEUE_FORMAT_VERSION,
        actions,
    })?)
}

/// Durable, ordered store of queued actions.
pub struct QueueStore {
    db: Mutex<Database>,
    status: watch::Sender<QueueStatus>,
}

impl QueueStore {
    /// Open the store at the default database location.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open() -> Result<Self, SyncError> {
        Self::with_database(Database::open()?)
    }

    /// Create a store over an existing database connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing queue cannot be read.
    pub fn with_database(db: Database) -> Result<Self, SyncError> {
        let actions = read_queue(&db)?;
        let (status, _) = watch::channel(QueueStatus::from_actions(&actions, false));
        Ok(Self {
            db: Mutex::new(db),
            status,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>, SyncError> {
        self.db
            .lock()
            .map_err(|_| SyncError::Database("queue store lock poisoned".to_string()))
    }

    /// Read the queue in FIFO order.
    ///
    /// A corrupt document reads as an empty queue.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database itself cannot be read.
    pub fn load(&self) -> Result<Vec<QueuedAction>, SyncError> {
        let db = self.lock()?;
        read_queue(&db)
    }

    /// Overwrite the stored queue with `actions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn persist(&self, actions: &[QueuedAction]) -> Result<(), SyncError> {
        let db = self.lock()?;
        self.write_locked(&db, actions)
    }

    fn write_locked(&self, db: &Database, actions: &[QueuedAction]) -> Result<(), SyncError> {
        db.set_value(QUEUE_STORAGE_KEY, &encode_queue(actions)?)?;
        self.status.send_modify(|status| {
            *status = QueueStatus::from_actions(actions, status.syncing);
        });
        Ok(())
    }

    fn modify<R>(&self, f: impl FnOnce(&mut Vec<QueuedAction>) -> R) -> Result<R, SyncError> {
        let db = self.lock()?;
        let mut actions = read_queue(&db)?;
        let result = f(&mut actions);
        self.write_locked(&db, &actions)?;
        Ok(result)
    }

    /// Append `action` at the tail and return the new queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn append(&self, action: QueuedAction) -> Result<Vec<QueuedAction>, SyncError> {
        self.modify(|actions| {
            actions.push(action);
            actions.clone()
        })
    }

    /// Remove the action with `id`. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn remove(&self, id: ActionId) -> Result<bool, SyncError> {
        self.modify(|actions| {
            let before = actions.len();
            actions.retain(|a| a.id != id);
            actions.len() != before
        })
    }

    /// Attach a failure message to the action with `id`, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn record_failure(&self, id: ActionId, message: &str) -> Result<bool, SyncError> {
        self.modify(|actions| match actions.iter_mut().find(|a| a.id == id) {
            Some(action) => {
                action.record_failure(message);
                true
            },
            None => false,
        })
    }

    /// Drop every queued action.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn clear(&self) -> Result<(), SyncError> {
        self.persist(&[])
    }

    /// Current status snapshot.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QueueStatus> {
        self.status.subscribe()
    }

    /// Flag a sync pass as running or finished.
    pub fn set_syncing(&self, syncing: bool) {
        self.status.send_if_modified(|status| {
            let changed = status.syncing != syncing;
            status.syncing = syncing;
            changed
        });
    }
}

fn read_queue(db: &Database) -> Result<Vec<QueuedAction>, SyncError> {
    Ok(db
        .get_value(QUEUE_STORAGE_KEY)?
        .map(|raw| decode_queue(&raw))
        .unwrap_or_default())
}
