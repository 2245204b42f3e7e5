//! Offline queue facade.
//!
//! [`OfflineQueue`] is what the rest of the application talks to: it exposes
//! the connectivity flag, the queue length and the syncing flag, captures
//! mutations as queued actions and drives the sync engine.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use super::action::{ActionType, QueuedAction};
use super::connectivity::{ConnectivityEvents, ConnectivityMonitor, Transition};
use super::dispatcher::EntityDispatcher;
use super::engine::{FlushOutcome, SyncEngine};
use super::entity::EntityPayload;
use super::identity::IdentityProvider;
use super::store::{QueueStatus, QueueStore};
use crate::backend::Backend;
use crate::error::SyncError;

/// Captures mutations while offline and replays them once connectivity is back.
pub struct OfflineQueue {
    store: Arc<QueueStore>,
    connectivity: ConnectivityMonitor,
    identity: Arc<dyn IdentityProvider>,
    engine: SyncEngine,
    flush_on_enqueue: bool,
}

impl OfflineQueue {
    #[must_use]
    pub fn new(
        store: Arc<QueueStore>,
        connectivity: ConnectivityMonitor,
        identity: Arc<dyn IdentityProvider>,
        dispatcher: EntityDispatcher,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let engine = SyncEngine::new(
            Arc::clone(&store),
            connectivity.clone(),
            Arc::clone(&identity),
            Arc::new(dispatcher),
            backend,
        );
        Self {
            store,
            connectivity,
            identity,
            engine,
            flush_on_enqueue: true,
        }
    }

    /// Whether enqueueing while online triggers a flush right away.
    #[must_use]
    pub fn with_flush_on_enqueue(mut self, enabled: bool) -> Self {
        self.flush_on_enqueue = enabled;
        self
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Number of actions waiting, failed ones included.
    #[must_use]
    pub fn queue_length(&self) -> usize {
        self.store.status().pending
    }

    #[must_use]
    pub fn syncing(&self) -> bool {
        self.store.status().syncing
    }

    #[must_use]
    pub fn status(&self) -> QueueStatus {
        self.store.status()
    }

    /// Watch queue length and syncing flag.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QueueStatus> {
        self.store.subscribe()
    }

    /// Stream of online/offline transitions.
    #[must_use]
    pub fn connectivity_events(&self) -> ConnectivityEvents {
        self.connectivity.subscribe()
    }

    /// Queued actions in the order they will be applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database cannot be read.
    pub fn actions(&self) -> Result<Vec<QueuedAction>, SyncError> {
        self.store.load()
    }

    /// Capture a mutation.
    ///
    /// The action is stored before this returns. When online, a flush is then
    /// attempted; its outcome does not affect the result since the action is
    /// already safe in the queue.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Identity` when nobody is signed in, or a storage
    /// error if the action could not be persisted. Nothing is queued in
    /// either case.
    pub async fn add_to_queue(
        &self,
        entity_type: &str,
        action_type: ActionType,
        payload: Value,
    ) -> Result<QueuedAction, SyncError> {
        let user_id = self.identity.current_user().await?;
        let action = QueuedAction::new(user_id, entity_type, action_type, payload);

        let queue = self.store.append(action.clone())?;
        info!(
            action_id = %action.id,
            entity_type,
            action_type = %action_type,
            pending = queue.len(),
            "action queued"
        );

        if self.flush_on_enqueue && self.is_online() {
            let outcome = self.engine.flush().await;
            debug!(?outcome, "flush after enqueue");
        }

        Ok(action)
    }

    /// Capture a typed entity mutation.
    ///
    /// # Errors
    ///
    /// See [`OfflineQueue::add_to_queue`].
    pub async fn add_entity(
        &self,
        action_type: ActionType,
        payload: EntityPayload,
    ) -> Result<QueuedAction, SyncError> {
        let value = payload.to_value()?;
        self.add_to_queue(payload.kind().tag(), action_type, value)
            .await
    }

    /// Flush the queue now.
    pub async fn sync_queue(&self) -> FlushOutcome {
        self.engine.flush().await
    }

    /// Drop every queued action without applying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database cannot be written.
    pub fn clear_queue(&self) -> Result<(), SyncError> {
        let dropped = self.store.status().pending;
        self.store.clear()?;
        info!(dropped, "queue cleared");
        Ok(())
    }

    /// Feed a connectivity observation.
    ///
    /// Coming back online flushes the queue and returns the outcome.
    pub async fn report_connectivity(&self, online: bool) -> Option<FlushOutcome> {
        match self.connectivity.report(online)? {
            Transition::BecameOnline => Some(self.engine.flush().await),
            Transition::BecameOffline => None,
        }
    }
}
