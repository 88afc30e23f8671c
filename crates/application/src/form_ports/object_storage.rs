use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hirely_core::AppResult;

/// Object listed in a storage bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Path inside the bucket.
    pub path: String,
    /// Upload time reported by the backend.
    pub created_at: DateTime<Utc>,
}

/// Port for the object storage holding candidate documents.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Writes an object and returns its public URL.
    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> AppResult<String>;

    /// Deletes an object.
    async fn delete_object(&self, bucket: &str, path: &str) -> AppResult<()>;

    /// Lists objects stored in a bucket.
    async fn list_objects(&self, bucket: &str) -> AppResult<Vec<StoredObject>>;

    /// Returns the public URL an object at `path` is served from.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
