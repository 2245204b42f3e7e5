//! Offline action queue and sync engine.
//!
//! Mutations made without network access are captured as [`QueuedAction`]s,
//! persisted in FIFO order and replayed against the backend once
//! connectivity returns. Failed actions stay queued with their error and are
//! retried on the next pass.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use sitesync::backend::{Backend, RestBackend};
//! use sitesync::config::Config;
//! use sitesync::sync::{
//!     ActionType, ConfiguredIdentity, ConnectivityMonitor, EntityDispatcher, OfflineQueue,
//!     QueueStore,
//! };
//!
//! # async fn demo() -> Result<(), sitesync::SyncError> {
//! let config = Config::load()?;
//! let backend: Arc<dyn Backend> = Arc::new(RestBackend::new(&config.backend)?);
//! let queue = OfflineQueue::new(
//!     Arc::new(QueueStore::open()?),
//!     ConnectivityMonitor::new(false),
//!     Arc::new(ConfiguredIdentity::new(config.session.clone())),
//!     EntityDispatcher::with_defaults(&backend),
//!     backend,
//! );
//!
//! queue
//!     .add_to_queue("ticket", ActionType::Create, json!({"title": "Cracked tile"}))
//!     .await?;
//! queue.report_connectivity(true).await;
//! # Ok(())
//! # }
//! ```

mod action;
mod connectivity;
mod dispatcher;
mod engine;
mod entity;
mod identity;
mod queue;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{ActionId, ActionType, OrganizationId, QueuedAction, UserId};
pub use connectivity::{probe, ConnectivityEvents, ConnectivityMonitor, Transition};
pub use dispatcher::{EntityDispatcher, EntityHandler, RecordHandler};
pub use engine::{FlushOutcome, SkipReason, SyncEngine, SyncReport};
pub use entity::{
    check_payload, DiaryEntryPayload, EntityFields, EntityKind, EntityPayload, MessagePayload,
    TicketPayload,
};
pub use identity::{resolve_context, ActingContext, ConfiguredIdentity, IdentityProvider};
pub use queue::OfflineQueue;
pub use store::{
    decode_queue, encode_queue, QueueStatus, QueueStore, QUEUE_FORMAT_VERSION, QUEUE_STORAGE_KEY,
};
