use std::collections::BTreeMap;

use async_trait::async_trait;
use hirely_core::AppResult;
use hirely_domain::{FieldDefinition, UploadConfig};

/// Repository port for the dynamic form field catalog.
#[async_trait]
pub trait FieldCatalogRepository: Send + Sync {
    /// Lists every field definition, active or not.
    async fn list_fields(&self) -> AppResult<Vec<FieldDefinition>>;

    /// Looks up one field definition by key.
    async fn find_field(&self, key: &str) -> AppResult<Option<FieldDefinition>>;

    /// Saves or replaces a field definition.
    async fn save_field(&self, field: FieldDefinition) -> AppResult<()>;

    /// Deletes a field definition. Returns whether a row was removed.
    async fn delete_field(&self, key: &str) -> AppResult<bool>;
}

/// Repository port for per-field upload policies.
#[async_trait]
pub trait UploadConfigRepository: Send + Sync {
    /// Lists upload policies keyed by field key.
    async fn list_upload_configs(&self) -> AppResult<BTreeMap<String, UploadConfig>>;

    /// Saves or replaces the policy for one field key.
    async fn save_upload_config(&self, field_key: &str, config: UploadConfig) -> AppResult<()>;

    /// Deletes the policy for one field key. Returns whether a row was removed.
    async fn delete_upload_config(&self, field_key: &str) -> AppResult<bool>;
}
