//! Object storage over a bucket-based HTTP storage API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hirely_application::{ObjectStorage, StoredObject};
use hirely_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const LIST_PAGE_SIZE: usize = 1000;

/// HTTP storage configuration.
#[derive(Clone)]
pub struct HttpObjectStorageConfig {
    /// Storage API base URL, e.g. `https://project.example.co/storage/v1`.
    pub base_url: String,
    /// Service key sent as bearer token and `apikey` header.
    pub api_key: String,
}

/// Object storage client for a REST storage service.
#[derive(Clone)]
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    created_at: Option<DateTime<Utc>>,
}

impl HttpObjectStorage {
    /// Creates a storage client with default HTTP settings.
    #[must_use]
    pub fn new(client: Client, config: HttpObjectStorageConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key,
        }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/{bucket}/{path}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(self.api_key.as_str())
            .header("apikey", self.api_key.as_str())
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> AppResult<String> {
        let response = self
            .authorized(self.client.post(self.object_url(bucket, path)))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("storage request failed: {error}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "storage rejected upload with status {status}: {body}"
            )));
        }

        debug!(bucket, path, size = bytes.len(), "object stored");
        Ok(self.public_url(bucket, path))
    }

    async fn delete_object(&self, bucket: &str, path: &str) -> AppResult<()> {
        let response = self
            .authorized(self.client.delete(self.object_url(bucket, path)))
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("storage request failed: {error}")))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Internal(format!(
            "storage rejected delete with status {status}: {body}"
        )))
    }

    async fn list_objects(&self, bucket: &str) -> AppResult<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut offset = 0;

        loop {
            let response = self
                .authorized(
                    self.client
                        .post(format!("{}/object/list/{bucket}", self.base_url)),
                )
                .json(&ListRequest {
                    prefix: "",
                    limit: LIST_PAGE_SIZE,
                    offset,
                })
                .send()
                .await
                .map_err(|error| {
                    AppError::Internal(format!("storage request failed: {error}"))
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Internal(format!(
                    "storage rejected listing with status {status}: {body}"
                )));
            }

            let page: Vec<ListedObject> = response.json().await.map_err(|error| {
                AppError::Internal(format!("failed to decode storage listing: {error}"))
            })?;
            let page_len = page.len();

            // Entries without a timestamp are folder placeholders.
            objects.extend(page.into_iter().filter_map(|object| {
                object.created_at.map(|created_at| StoredObject {
                    path: object.name,
                    created_at,
                })
            }));

            if page_len < LIST_PAGE_SIZE {
                break;
            }
            offset += page_len;
        }

        Ok(objects)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/public/{bucket}/{path}", self.base_url)
    }
}
