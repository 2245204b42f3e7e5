//! Acting user and organization lookup.

use async_trait::async_trait;

use super::action::{OrganizationId, UserId};
use crate::config::SessionConfig;
use crate::error::SyncError;

/// Who a sync pass acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingContext {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
}

/// Read-only access to the current session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The authenticated user.
    async fn current_user(&self) -> Result<UserId, SyncError>;

    /// The organization `user` acts for.
    async fn organization_for(&self, user: &UserId) -> Result<OrganizationId, SyncError>;
}

/// Resolve user and organization in one go.
///
/// # Errors
///
/// Returns the first lookup failure.
pub async fn resolve_context(identity: &dyn IdentityProvider) -> Result<ActingContext, SyncError> {
    let user_id = identity.current_user().await?;
    let organization_id = identity.organization_for(&user_id).await?;
    Ok(ActingContext {
        user_id,
        organization_id,
    })
}

/// Identity taken from the `session` configuration section.
#[derive(Debug, Clone)]
pub struct ConfiguredIdentity {
    session: SessionConfig,
}

impl ConfiguredIdentity {
    #[must_use]
    pub const fn new(session: SessionConfig) -> Self {
        Self { session }
    }
}

#[async_trait]
impl IdentityProvider for ConfiguredIdentity {
    async fn current_user(&self) -> Result<UserId, SyncError> {
        self.session
            .user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(UserId::new)
            .ok_or_else(|| SyncError::Identity("no signed-in user".to_string()))
    }

    async fn organization_for(&self, user: &UserId) -> Result<OrganizationId, SyncError> {
        self.session
            .organization_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(OrganizationId::new)
            .ok_or_else(|| SyncError::Identity(format!("no organization for user {user}")))
    }
}
