use std::collections::HashMap;

use async_trait::async_trait;
use hirely_application::DraftStore;
use hirely_core::AppResult;
use tokio::sync::RwLock;

/// Process-local draft store. Drafts are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    items: RwLock<HashMap<String, String>>,
}

impl InMemoryDraftStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> AppResult<()> {
        self.items.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
