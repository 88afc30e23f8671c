use std::sync::Arc;

use async_trait::async_trait;
use hirely_core::{AppError, AppResult, UserIdentity};
use hirely_domain::Permission;
use tracing::debug;

/// Repository port for permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists effective permissions for a subject.
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>>;
}

/// Application service for staff authorization checks.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Ensures the actor holds the required permission.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<()> {
        if self.has_permission(actor, permission).await? {
            return Ok(());
        }

        debug!(
            subject = actor.subject(),
            permission = permission.as_str(),
            "permission denied"
        );
        Err(AppError::Forbidden(format!(
            "subject '{}' is missing permission '{}'",
            actor.subject(),
            permission.as_str()
        )))
    }

    /// Returns whether the actor currently holds the permission.
    pub async fn has_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<bool> {
        let permissions = self
            .repository
            .list_permissions_for_subject(actor.subject())
            .await?;

        Ok(permissions.contains(&permission))
    }
}
