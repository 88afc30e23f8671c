use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;

use hirely_application::{FieldCatalogRepository, UploadConfigRepository};
use hirely_core::{AppError, AppResult};
use hirely_domain::{
    FieldDefinition, FieldDefinitionInput, FieldSection, FieldType, UploadConfig,
    ValidationRules,
};

use serde_json::Value;
use sqlx::{FromRow, PgPool};


/// PostgreSQL-backed field catalog and upload policy store.
#[derive(Clone)]
pub struct PostgresFormRepository {
    pool: PgPool,
}

impl PostgresFormRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct FieldRow {
    key: String,
    field_type: String,
    label: String,
    placeholder: Option<String>,
    description: Option<String>,
    required: bool,
    validation_rules: Option<Value>,
    section: String,
    display_order: i32,
    active: bool,
}

impl FieldRow {
    fn into_definition(self) -> AppResult<FieldDefinition> {
        let key = self.key;
        let decode_error = |error: AppError| {
            AppError::Internal(format!("persisted field '{key}' is invalid: {error}"))
        };

        let validation_rules = self
            .validation_rules
            .map(serde_json::from_value::<ValidationRules>)
            .transpose()
            .map_err(|error| AppError::Validation(error.to_string()))
            .map_err(decode_error)?;

        FieldDefinition::new(FieldDefinitionInput {
            key: key.clone(),
            field_type: FieldType::from_str(self.field_type.as_str()).map_err(decode_error)?,
            label: self.label,
            placeholder: self.placeholder,
            description: self.description,
            required: self.required,
            validation_rules,
            section: FieldSection::from_str(self.section.as_str()).map_err(decode_error)?,
            display_order: self.display_order,
            active: self.active,
        })
        .map_err(decode_error)
    }
}

#[derive(Debug, FromRow)]
struct UploadConfigRow {
    field_key: String,
    bucket_name: String,
    max_size_bytes: i64,
    allowed_extensions: Vec<String>,
    allowed_mime_types: Vec<String>,
}

#[async_trait]
impl FieldCatalogRepository for PostgresFormRepository {
    async fn list_fields(&self) -> AppResult<Vec<FieldDefinition>> {
        let rows = sqlx::query_as::<_, FieldRow>(
            r#"
            SELECT key, field_type, label, placeholder, description, required,
                   validation_rules, section, display_order, active
            FROM form_fields
            ORDER BY display_order, key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list form fields: {error}")))?;

        rows.into_iter().map(FieldRow::into_definition).collect()
    }

    async fn find_field(&self, key: &str) -> AppResult<Option<FieldDefinition>> {
        let row = sqlx::query_as::<_, FieldRow>(
            r#"
            SELECT key, field_type, label, placeholder, description, required,
                   validation_rules, section, display_order, active
            FROM form_fields
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find form field: {error}")))?;

        row.map(FieldRow::into_definition).transpose()
    }

    async fn save_field(&self, field: FieldDefinition) -> AppResult<()> {
        let validation_rules = field
            .validation_rules()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!("failed to encode validation rules: {error}"))
            })?;

        sqlx::query(
            r#"
            INSERT INTO form_fields (
                key, field_type, label, placeholder, description, required,
                validation_rules, section, display_order, active, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            ON CONFLICT (key) DO UPDATE SET
                field_type = EXCLUDED.field_type,
                label = EXCLUDED.label,
                placeholder = EXCLUDED.placeholder,
                description = EXCLUDED.description,
                required = EXCLUDED.required,
                validation_rules = EXCLUDED.validation_rules,
                section = EXCLUDED.section,
                display_order = EXCLUDED.display_order,
                active = EXCLUDED.active,
                updated_at = NOW()
            "#,
        )
        .bind(field.key())
        .bind(field.field_type().as_str())
        .bind(field.label())
        .bind(field.placeholder())
        .bind(field.description())
        .bind(field.is_required())
        .bind(validation_rules)
        .bind(field.section().as_str())
        .bind(field.display_order())
        .bind(field.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save form field: {error}")))?;

        Ok(())
    }

    async fn delete_field(&self, key: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM form_fields WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete form field: {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UploadConfigRepository for PostgresFormRepository {
    async fn list_upload_configs(&self) -> AppResult<BTreeMap<String, UploadConfig>> {
        let rows = sqlx::query_as::<_, UploadConfigRow>(
            r#"
            SELECT field_key, bucket_name, max_size_bytes, allowed_extensions, allowed_mime_types
            FROM upload_configs
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list upload configs: {error}")))?;

        rows.into_iter()
            .map(|row| {
                let max_size_bytes = u64::try_from(row.max_size_bytes).map_err(|error| {
                    AppError::Internal(format!(
                        "persisted upload config '{}' has an invalid size: {error}",
                        row.field_key
                    ))
                })?;
                let config = UploadConfig::new(
                    row.bucket_name,
                    max_size_bytes,
                    &row.allowed_extensions,
                    &row.allowed_mime_types,
                )
                .map_err(|error| {
                    AppError::Internal(format!(
                        "persisted upload config '{}' is invalid: {error}",
                        row.field_key
                    ))
                })?;

                Ok((row.field_key, config))
            })
            .collect()
    }

    async fn save_upload_config(&self, field_key: &str, config: UploadConfig) -> AppResult<()> {
        let max_size_bytes = i64::try_from(config.max_size_bytes()).map_err(|error| {
            AppError::Validation(format!("max_size_bytes is out of range: {error}"))
        })?;
        let extensions: Vec<&str> = config
            .allowed_extensions()
            .iter()
            .map(String::as_str)
            .collect();
        let mime_types: Vec<&str> = config
            .allowed_mime_types()
            .iter()
            .map(String::as_str)
            .collect();

        let result = sqlx::query(
            r#"
            INSERT INTO upload_configs (
                field_key, bucket_name, max_size_bytes, allowed_extensions,
                allowed_mime_types, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (field_key) DO UPDATE SET
                bucket_name = EXCLUDED.bucket_name,
                max_size_bytes = EXCLUDED.max_size_bytes,
                allowed_extensions = EXCLUDED.allowed_extensions,
                allowed_mime_types = EXCLUDED.allowed_mime_types,
                updated_at = NOW()
            "#,
        )
        .bind(field_key)
        .bind(config.bucket_name())
        .bind(max_size_bytes)
        .bind(extensions)
        .bind(mime_types)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23503")
                {
                    return Err(AppError::NotFound(format!(
                        "field '{field_key}' does not exist"
                    )));
                }

                Err(AppError::Internal(format!(
                    "failed to save upload config: {error}"
                )))
            }
        }
    }

    async fn delete_upload_config(&self, field_key: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM upload_configs WHERE field_key = $1")
            .bind(field_key)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete upload config: {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
