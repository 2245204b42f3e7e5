//! Entity kinds and their typed payloads.
//!
//! The queue stores payloads as opaque JSON. The types here describe what
//! each known entity kind carries, so that typed callers get compile-time
//! checked payloads and handlers can reject malformed ones before writing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::action::ActionType;
use crate::error::SyncError;

/// Entity kinds with a built-in handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// After-sales support ticket
    Ticket,
    /// Construction site diary entry
    DiaryEntry,
    /// Chat message
    Message,
}

impl EntityKind {
    pub const ALL: [Self; 3] = [Self::Ticket, Self::DiaryEntry, Self::Message];

    /// Tag stored in `QueuedAction::entity_type`.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::DiaryEntry => "diary-entry",
            Self::Message => "message",
        }
    }

    /// Backend table the entity is written to.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Ticket => "sav_tickets",
            Self::DiaryEntry => "site_diary_entries",
            Self::Message => "messages",
        }
    }

    /// Look up a kind by its tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Check `payload` against this kind's fields for `action_type`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidPayload` as [`check_payload`] does.
    pub fn validate(&self, action_type: ActionType, payload: &Value) -> Result<(), SyncError> {
        match self {
            Self::Ticket => check_payload::<TicketPayload>(action_type, payload).map(drop),
            Self::DiaryEntry => check_payload::<DiaryEntryPayload>(action_type, payload).map(drop),
            Self::Message => check_payload::<MessagePayload>(action_type, payload).map(drop),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

/// Row ids arrive as strings or as numbers; both are kept as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    }))
}

/// Ticket row fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketPayload {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Site diary row fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntryPayload {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workforce: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_phase_id: Option<String>,
}

/// Chat message row fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Required fields checked before a typed payload is written.
pub trait EntityFields: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Row id, needed by updates and deletes.
    fn row_id(&self) -> Option<&str>;

    /// Check the fields an insert needs.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidPayload` naming the missing field.
    fn validate_create(&self) -> Result<(), SyncError>;
}

fn require(field: Option<&str>, name: &str) -> Result<(), SyncError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(SyncError::InvalidPayload(format!("missing {name}"))),
    }
}

impl EntityFields for TicketPayload {
    fn row_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate_create(&self) -> Result<(), SyncError> {
        require(self.title.as_deref(), "title")
    }
}

impl EntityFields for DiaryEntryPayload {
    fn row_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate_create(&self) -> Result<(), SyncError> {
        require(self.project_id.as_deref(), "project_id")?;
        require(self.entry_date.as_deref(), "entry_date")
    }
}

impl EntityFields for MessagePayload {
    fn row_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate_create(&self) -> Result<(), SyncError> {
        require(self.body.as_deref(), "body")
    }
}

/// Decode and check `payload` for `action_type`.
///
/// # Errors
///
/// Returns `SyncError::InvalidPayload` when the payload does not decode, an
/// insert misses a required field, or an update/delete has no row id.
pub fn check_payload<T: EntityFields>(
    action_type: ActionType,
    payload: &Value,
) -> Result<T, SyncError> {
    let typed: T = serde_json::from_value(payload.clone())
        .map_err(|e| SyncError::InvalidPayload(e.to_string()))?;

    if action_type.targets_existing() {
        require(typed.row_id(), "id")?;
    } else {
        typed.validate_create()?;
    }

    Ok(typed)
}

/// A payload tagged with its entity kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityPayload {
    Ticket(TicketPayload),
    DiaryEntry(DiaryEntryPayload),
    Message(MessagePayload),
}

impl EntityPayload {
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Ticket(_) => EntityKind::Ticket,
            Self::DiaryEntry(_) => EntityKind::DiaryEntry,
            Self::Message(_) => EntityKind::Message,
        }
    }

    /// Serialize into the opaque form stored in the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> Result<Value, SyncError> {
        let value = match self {
            Self::Ticket(p) => serde_json::to_value(p)?,
            Self::DiaryEntry(p) => serde_json::to_value(p)?,
            Self::Message(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }
}
