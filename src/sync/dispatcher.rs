//! Entity dispatcher.
//!
//! Maps an action's `entity_type` to the handler that performs its backend
//! write. Handlers are registered at runtime, so adding an entity type never
//! touches the sync engine.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::action::{ActionType, QueuedAction};
use super::entity::{
    check_payload, DiaryEntryPayload, EntityFields, EntityKind, MessagePayload, TicketPayload,
};
use super::identity::ActingContext;
use crate::backend::Backend;
use crate::error::SyncError;

/// Applies one entity type's actions to the backend.
#[async_trait]
pub trait EntityHandler: Send + Sync {
    async fn apply(&self, action: &QueuedAction, ctx: &ActingContext) -> Result<(), SyncError>;
}

/// Handler writing rows of a single table.
///
/// The payload is checked against `T` and then forwarded unchanged.
pub struct RecordHandler<T> {
    table: &'static str,
    backend: Arc<dyn Backend>,
    _fields: PhantomData<fn() -> T>,
}

impl<T: EntityFields> RecordHandler<T> {
    #[must_use]
    pub fn new(table: &'static str, backend: Arc<dyn Backend>) -> Self {
        Self {
            table,
            backend,
            _fields: PhantomData,
        }
    }
}

#[async_trait]
impl<T: EntityFields> EntityHandler for RecordHandler<T> {
    async fn apply(&self, action: &QueuedAction, _ctx: &ActingContext) -> Result<(), SyncError> {
        let fields: T = check_payload(action.action_type, &action.payload)?;

        if !action.action_type.targets_existing() {
            return self
                .backend
                .insert(self.table, &action.payload, action.id)
                .await;
        }

        let id = fields
            .row_id()
            .ok_or_else(|| SyncError::InvalidPayload("missing id".to_string()))?;
        if action.action_type == ActionType::Update {
            self.backend
                .update(self.table, id, &action.payload, action.id)
                .await
        } else {
            self.backend.delete(self.table, id, action.id).await
        }
    }
}

/// Registry of entity handlers keyed by entity type tag.
#[derive(Default)]
pub struct EntityDispatcher {
    handlers: HashMap<String, Arc<dyn EntityHandler>>,
}

impl EntityDispatcher {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with handlers for every [`EntityKind`].
    #[must_use]
    pub fn with_defaults(backend: &Arc<dyn Backend>) -> Self {
        let mut dispatcher = Self::new();
        for kind in EntityKind::ALL {
            let handler: Arc<dyn EntityHandler> = match kind {
                EntityKind::Ticket => {
                    Arc::new(RecordHandler::<TicketPayload>::new(kind.table(), Arc::clone(backend)))
                },
                EntityKind::DiaryEntry => Arc::new(RecordHandler::<DiaryEntryPayload>::new(
                    kind.table(),
                    Arc::clone(backend),
                )),
                EntityKind::Message => {
                    Arc::new(RecordHandler::<MessagePayload>::new(kind.table(), Arc::clone(backend)))
                },
            };
            dispatcher.register(kind.tag(), handler);
        }
        dispatcher
    }

    /// Register `handler` for `entity_type`, returning the one it replaces.
    pub fn register(
        &mut self,
        entity_type: impl Into<String>,
        handler: Arc<dyn EntityHandler>,
    ) -> Option<Arc<dyn EntityHandler>> {
        self.handlers.insert(entity_type.into(), handler)
    }

    #[must_use]
    pub fn handles(&self, entity_type: &str) -> bool {
        self.handlers.contains_key(entity_type)
    }

    /// Registered entity types, sorted.
    #[must_use]
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Apply `action` through its handler.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownEntity` when no handler is registered, or
    /// whatever the handler reports.
    pub async fn apply(&self, action: &QueuedAction, ctx: &ActingContext) -> Result<(), SyncError> {
        let Some(handler) = self.handlers.get(&action.entity_type) else {
            warn!(
                entity_type = %action.entity_type,
                action_id = %action.id,
                "no handler registered, keeping action queued"
            );
            return Err(SyncError::UnknownEntity(action.entity_type.clone()));
        };

        handler.apply(action, ctx).await
    }
}
