use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use hirely_application::AuthorizationRepository;
use hirely_core::AppResult;
use hirely_domain::Permission;
use tokio::sync::RwLock;

/// In-memory permission grants keyed by subject.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationRepository {
    grants: RwLock<BTreeMap<String, BTreeSet<&'static str>>>,
}

impl InMemoryAuthorizationRepository {
    /// Creates a repository without grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a permission to a subject.
    pub async fn grant(&self, subject: impl Into<String>, permission: Permission) {
        self.grants
            .write()
            .await
            .entry(subject.into())
            .or_default()
            .insert(permission.as_str());
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryAuthorizationRepository {
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
        let grants = self.grants.read().await;
        let Some(granted) = grants.get(subject) else {
            return Ok(Vec::new());
        };

        Ok(Permission::all()
            .iter()
            .copied()
            .filter(|permission| granted.contains(permission.as_str()))
            .collect())
    }
}
