//! Queued action types.
//!
//! A [`QueuedAction`] is one user mutation captured for later replay. The
//! payload is kept as an opaque JSON value; only the entity handler that
//! eventually applies it looks inside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::SyncError;

/// Locally generated action identifier.
///
/// Also sent to the backend with every write so repeated deliveries of the
/// same action can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(Uuid);

impl ActionId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Organization (tenant) id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of mutation a queued action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Insert a new row
    Create,
    /// Update an existing row
    Update,
    /// Delete an existing row
    Delete,
}

impl ActionType {
    /// Wire name of this action type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the action targets an existing row and needs its id.
    #[must_use]
    pub const fn targets_existing(&self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" | "INSERT" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(SyncError::InvalidPayload(format!("Unknown action type: {s}"))),
        }
    }
}

/// A mutation waiting to be applied to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: ActionId,
    /// Actor who originated the action
    pub user_id: UserId,
    pub action_type: ActionType,
    /// Tag selecting the entity handler
    pub entity_type: String,
    /// Body forwarded untouched to the backend write
    pub payload: Value,
    /// Enqueue time; defines FIFO order
    pub created_at: DateTime<Utc>,
    /// Set only once the action has been applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    /// Reason of the most recent failed attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl QueuedAction {
    /// Create a new pending action stamped with the current time.
    #[must_use]
    pub fn new(
        user_id: UserId,
        entity_type: impl Into<String>,
        action_type: ActionType,
        payload: Value,
    ) -> Self {
        Self {
            id: ActionId::generate(),
            user_id,
            action_type,
            entity_type: entity_type.into(),
            payload,
            created_at: Utc::now(),
            synced_at: None,
            error_message: None,
        }
    }

    /// Whether the last attempt failed.
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.error_message.is_some()
    }

    /// Record a successful application.
    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.synced_at = Some(at);
        self.error_message = None;
    }

    /// Record the reason of a failed attempt.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Id of the row an update or delete targets, read from the payload.
    #[must_use]
    pub fn target_id(&self) -> Option<String> {
        match self.payload.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
