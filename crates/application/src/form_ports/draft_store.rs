use async_trait::async_trait;
use hirely_core::AppResult;

/// Local persistent key/value storage holding form drafts.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Reads one value.
    async fn get_item(&self, key: &str) -> AppResult<Option<String>>;

    /// Writes one value.
    async fn set_item(&self, key: &str, value: String) -> AppResult<()>;

    /// Removes one value. Missing keys are not an error.
    async fn remove_item(&self, key: &str) -> AppResult<()>;
}
