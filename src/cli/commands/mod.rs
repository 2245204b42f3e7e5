//! Command implementations for sitesync.

mod completions;
mod queue;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::backend::{Backend, RestBackend};
use crate::config::Config;
use crate::error::SyncError;
use crate::sync::{
    probe, ConfiguredIdentity, ConnectivityMonitor, EntityDispatcher, OfflineQueue, QueueStore,
};

pub use completions::completions;
pub use queue::{add, clear, list, status, sync};

/// Wire the offline queue from configuration.
///
/// Connectivity starts from a probe of the backend host unless `offline`
/// forces it down.
///
/// # Errors
///
/// Returns an error if the local database cannot be opened or the backend
/// client cannot be built.
pub async fn open_queue(config: &Config, offline: bool) -> Result<OfflineQueue, SyncError> {
    let store = Arc::new(QueueStore::open()?);
    let backend: Arc<dyn Backend> = Arc::new(RestBackend::new(&config.backend)?);

    let online = if offline {
        false
    } else {
        probe(
            &config.backend.url,
            Duration::from_millis(config.sync.probe_timeout_ms),
        )
        .await
    };
    debug!(online, offline, "initial connectivity");

    Ok(OfflineQueue::new(
        store,
        ConnectivityMonitor::new(online),
        Arc::new(ConfiguredIdentity::new(config.session.clone())),
        EntityDispatcher::with_defaults(&backend),
        backend,
    )
    .with_flush_on_enqueue(config.sync.flush_on_enqueue))
}
