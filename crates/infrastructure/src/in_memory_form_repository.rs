use std::collections::BTreeMap;

use async_trait::async_trait;
use hirely_application::{FieldCatalogRepository, UploadConfigRepository};
use hirely_core::{AppError, AppResult};
use hirely_domain::{FieldDefinition, FieldType, UploadConfig, sort_fields};
use tokio::sync::RwLock;

/// In-memory field catalog and upload policy store.
#[derive(Debug, Default)]
pub struct InMemoryFormRepository {
    fields: RwLock<BTreeMap<String, FieldDefinition>>,
    upload_configs: RwLock<BTreeMap<String, UploadConfig>>,
}

impl InMemoryFormRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with fields and upload policies.
    #[must_use]
    pub fn with_catalog(
        fields: impl IntoIterator<Item = FieldDefinition>,
        upload_configs: impl IntoIterator<Item = (String, UploadConfig)>,
    ) -> Self {
        Self {
            fields: RwLock::new(
                fields
                    .into_iter()
                    .map(|field| (field.key().to_owned(), field))
                    .collect(),
            ),
            upload_configs: RwLock::new(upload_configs.into_iter().collect()),
        }
    }
}

#[async_trait]
impl FieldCatalogRepository for InMemoryFormRepository {
    async fn list_fields(&self) -> AppResult<Vec<FieldDefinition>> {
        let mut fields: Vec<FieldDefinition> = self.fields.read().await.values().cloned().collect();
        sort_fields(&mut fields);
        Ok(fields)
    }

    async fn find_field(&self, key: &str) -> AppResult<Option<FieldDefinition>> {
        Ok(self.fields.read().await.get(key).cloned())
    }

    async fn save_field(&self, field: FieldDefinition) -> AppResult<()> {
        self.fields
            .write()
            .await
            .insert(field.key().to_owned(), field);
        Ok(())
    }

    async fn delete_field(&self, key: &str) -> AppResult<bool> {
        let removed = self.fields.write().await.remove(key).is_some();
        if removed {
            self.upload_configs.write().await.remove(key);
        }
        Ok(removed)
    }
}

#[async_trait]
impl UploadConfigRepository for InMemoryFormRepository {
    async fn list_upload_configs(&self) -> AppResult<BTreeMap<String, UploadConfig>> {
        Ok(self.upload_configs.read().await.clone())
    }

    async fn save_upload_config(&self, field_key: &str, config: UploadConfig) -> AppResult<()> {
        let is_file_field = self
            .fields
            .read()
            .await
            .get(field_key)
            .map(|field| field.field_type() == FieldType::File);
        match is_file_field {
            None => {
                return Err(AppError::NotFound(format!(
                    "field '{field_key}' does not exist"
                )));
            }
            Some(false) => {
                return Err(AppError::Validation(format!(
                    "field '{field_key}' is not a file field"
                )));
            }
            Some(true) => {}
        }

        self.upload_configs
            .write()
            .await
            .insert(field_key.to_owned(), config);
        Ok(())
    }

    async fn delete_upload_config(&self, field_key: &str) -> AppResult<bool> {
        Ok(self.upload_configs.write().await.remove(field_key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use hirely_application::{FieldCatalogRepository, UploadConfigRepository};
    use hirely_domain::{
        FieldDefinition, FieldDefinitionInput, FieldSection, FieldType, UploadConfig,
    };

    use super::InMemoryFormRepository;

    fn field(key: &str, display_order: i32) -> FieldDefinition {
        FieldDefinition::new(FieldDefinitionInput {
            key: key.to_owned(),
            field_type: FieldType::File,
            label: key.to_owned(),
            placeholder: None,
            description: None,
            required: false,
            validation_rules: None,
            section: FieldSection::Documents,
            display_order,
            active: true,
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn fields_are_listed_in_display_order_and_delete_cascades() {
        let config = UploadConfig::new("resumes", 10, ["pdf"], ["application/pdf"])
            .unwrap_or_else(|_| unreachable!());
        let repository = InMemoryFormRepository::with_catalog(
            [field("portfolio", 2), field("cv", 1)],
            [("cv".to_owned(), config)],
        );

        let keys: Vec<String> = repository
            .list_fields()
            .await
            .unwrap_or_default()
            .iter()
            .map(|field| field.key().to_owned())
            .collect();
        assert_eq!(keys, vec!["cv", "portfolio"]);

        assert_eq!(repository.delete_field("cv").await.ok(), Some(true));
        assert!(
            repository
                .list_upload_configs()
                .await
                .unwrap_or_default()
                .is_empty()
        );
    }
}
