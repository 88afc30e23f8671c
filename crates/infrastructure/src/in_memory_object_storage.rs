use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hirely_application::{ObjectStorage, StoredObject};
use hirely_core::AppResult;
use tokio::sync::RwLock;

/// One object held by [`InMemoryObjectStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryObject {
    /// Stored bytes.
    pub bytes: Vec<u8>,
    /// MIME type given at upload.
    pub content_type: String,
    /// When the object was written.
    pub created_at: DateTime<Utc>,
}

/// Process-local object storage for development and tests.
#[derive(Debug)]
pub struct InMemoryObjectStorage {
    public_base_url: String,
    objects: RwLock<BTreeMap<(String, String), InMemoryObject>>,
}

impl InMemoryObjectStorage {
    /// Creates an empty store whose public URLs start with `public_base_url`.
    #[must_use]
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into().trim_end_matches('/').to_owned(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the object stored under `bucket`/`path`.
    pub async fn get_object(&self, bucket: &str, path: &str) -> Option<InMemoryObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_owned(), path.to_owned()))
            .cloned()
    }

    /// Returns the number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> AppResult<String> {
        self.objects.write().await.insert(
            (bucket.to_owned(), path.to_owned()),
            InMemoryObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_owned(),
                created_at: Utc::now(),
            },
        );
        Ok(self.public_url(bucket, path))
    }

    async fn delete_object(&self, bucket: &str, path: &str) -> AppResult<()> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_owned(), path.to_owned()));
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> AppResult<Vec<StoredObject>> {
        Ok(self
            .objects
            .read()
            .await
            .iter()
            .filter(|((stored_bucket, _), _)| stored_bucket == bucket)
            .map(|((_, path), object)| StoredObject {
                path: path.clone(),
                created_at: object.created_at,
            })
            .collect())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{bucket}/{path}", self.public_base_url)
    }
}
