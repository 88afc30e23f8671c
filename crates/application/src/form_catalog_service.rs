use std::collections::BTreeMap;
use std::sync::Arc;

use hirely_core::{AppError, AppResult, UserIdentity};
use hirely_domain::{
    FieldDefinition, FieldDefinitionInput, FieldType, Permission, UploadConfig, sort_fields,
};
use tracing::info;

use crate::authorization_service::AuthorizationService;
use crate::form_ports::{FieldCatalogRepository, UploadConfigRepository};

/// Public catalog reads and staff administration of fields and upload policies.
#[derive(Clone)]
pub struct FormCatalogService {
    authorization_service: AuthorizationService,
    fields: Arc<dyn FieldCatalogRepository>,
    upload_configs: Arc<dyn UploadConfigRepository>,
}

impl FormCatalogService {
    /// Creates a catalog service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        fields: Arc<dyn FieldCatalogRepository>,
        upload_configs: Arc<dyn UploadConfigRepository>,
    ) -> Self {
        Self {
            authorization_service,
            fields,
            upload_configs,
        }
    }

    /// Returns the fields applicants see, in display order.
    pub async fn active_fields(&self) -> AppResult<Vec<FieldDefinition>> {
        let mut fields: Vec<FieldDefinition> = self
            .fields
            .list_fields()
            .await?
            .into_iter()
            .filter(FieldDefinition::is_active)
            .collect();
        sort_fields(&mut fields);
        Ok(fields)
    }

    /// Returns every field including inactive ones.
    pub async fn list_fields(&self, actor: &UserIdentity) -> AppResult<Vec<FieldDefinition>> {
        self.authorization_service
            .require_permission(actor, Permission::FormCatalogManage)
            .await?;

        let mut fields = self.fields.list_fields().await?;
        sort_fields(&mut fields);
        Ok(fields)
    }

    /// Creates or replaces a field.
    ///
    /// A file field with an upload policy cannot change to another type.
    pub async fn save_field(
        &self,
        actor: &UserIdentity,
        input: FieldDefinitionInput,
    ) -> AppResult<FieldDefinition> {
        self.authorization_service
            .require_permission(actor, Permission::FormCatalogManage)
            .await?;

        let field = FieldDefinition::new(input)?;
        if field.field_type() != FieldType::File
            && self
                .upload_configs
                .list_upload_configs()
                .await?
                .contains_key(field.key())
        {
            return Err(AppError::Conflict(format!(
                "field '{}' has an upload policy and must stay a file field",
                field.key()
            )));
        }

        self.fields.save_field(field.clone()).await?;
        info!(
            actor = actor.subject(),
            field_key = field.key(),
            field_type = field.field_type().as_str(),
            "form field saved"
        );
        Ok(field)
    }

    /// Shows or hides a field without deleting it.
    pub async fn set_field_active(
        &self,
        actor: &UserIdentity,
        key: &str,
        active: bool,
    ) -> AppResult<FieldDefinition> {
        self.authorization_service
            .require_permission(actor, Permission::FormCatalogManage)
            .await?;

        let field = self
            .fields
            .find_field(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("field '{key}' does not exist")))?
            .with_active(active);
        self.fields.save_field(field.clone()).await?;
        info!(actor = actor.subject(), field_key = key, active, "form field toggled");
        Ok(field)
    }

    /// Deletes a field together with its upload policy.
    pub async fn delete_field(&self, actor: &UserIdentity, key: &str) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::FormCatalogManage)
            .await?;

        if !self.fields.delete_field(key).await? {
            return Err(AppError::NotFound(format!("field '{key}' does not exist")));
        }
        self.upload_configs.delete_upload_config(key).await?;
        info!(actor = actor.subject(), field_key = key, "form field deleted");
        Ok(())
    }

    /// Returns every upload policy keyed by field key.
    pub async fn list_upload_configs(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<BTreeMap<String, UploadConfig>> {
        self.authorization_service
            .require_permission(actor, Permission::FormUploadConfigManage)
            .await?;

        self.upload_configs.list_upload_configs().await
    }

    /// Creates or replaces the upload policy of a file field.
    pub async fn save_upload_config(
        &self,
        actor: &UserIdentity,
        key: &str,
        config: UploadConfig,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::FormUploadConfigManage)
            .await?;

        let field = self
            .fields
            .find_field(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("field '{key}' does not exist")))?;
        if field.field_type() != FieldType::File {
            return Err(AppError::Validation(format!(
                "field '{key}' is a {} field and cannot accept uploads",
                field.field_type().as_str()
            )));
        }

        info!(
            actor = actor.subject(),
            field_key = key,
            bucket = config.bucket_name(),
            max_size_bytes = config.max_size_bytes(),
            "upload policy saved"
        );
        self.upload_configs.save_upload_config(key, config).await
    }

    /// Deletes the upload policy of a field.
    pub async fn delete_upload_config(&self, actor: &UserIdentity, key: &str) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::FormUploadConfigManage)
            .await?;

        if !self.upload_configs.delete_upload_config(key).await? {
            return Err(AppError::NotFound(format!(
                "field '{key}' has no upload policy"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use hirely_core::{AppError, AppResult, UserIdentity};
    use hirely_domain::{
        FieldDefinition, FieldDefinitionInput, FieldSection, FieldType, Permission, UploadConfig,
    };

    use crate::authorization_service::{AuthorizationRepository, AuthorizationService};
    use crate::form_ports::{FieldCatalogRepository, UploadConfigRepository};

    use super::FormCatalogService;

    struct FakeAuthorizationRepository {
        grants: HashMap<String, Vec<Permission>>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
            Ok(self.grants.get(subject).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeCatalog {
        fields: Mutex<BTreeMap<String, FieldDefinition>>,
        configs: Mutex<BTreeMap<String, UploadConfig>>,
    }

    #[async_trait]
    impl FieldCatalogRepository for FakeCatalog {
        async fn list_fields(&self) -> AppResult<Vec<FieldDefinition>> {
            Ok(self.fields.lock().await.values().cloned().collect())
        }

        async fn find_field(&self, key: &str) -> AppResult<Option<FieldDefinition>> {
            Ok(self.fields.lock().await.get(key).cloned())
        }

        async fn save_field(&self, field: FieldDefinition) -> AppResult<()> {
            self.fields
                .lock()
                .await
                .insert(field.key().to_owned(), field);
            Ok(())
        }

        async fn delete_field(&self, key: &str) -> AppResult<bool> {
            Ok(self.fields.lock().await.remove(key).is_some())
        }
    }

    #[async_trait]
    impl UploadConfigRepository for FakeCatalog {
        async fn list_upload_configs(&self) -> AppResult<BTreeMap<String, UploadConfig>> {
            Ok(self.configs.lock().await.clone())
        }

        async fn save_upload_config(&self, field_key: &str, config: UploadConfig) -> AppResult<()> {
            self.configs
                .lock()
                .await
                .insert(field_key.to_owned(), config);
            Ok(())
        }

        async fn delete_upload_config(&self, field_key: &str) -> AppResult<bool> {
            Ok(self.configs.lock().await.remove(field_key).is_some())
        }
    }

    fn admin() -> UserIdentity {
        UserIdentity::new("admin", "Admin", None)
    }

    fn service(store: Arc<FakeCatalog>) -> FormCatalogService {
        let mut grants = HashMap::new();
        grants.insert(
            "admin".to_owned(),
            vec![
                Permission::FormCatalogManage,
                Permission::FormUploadConfigManage,
            ],
        );
        FormCatalogService::new(
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository { grants })),
            store.clone(),
            store,
        )
    }

    fn input(key: &str, field_type: FieldType, display_order: i32) -> FieldDefinitionInput {
        FieldDefinitionInput {
            key: key.to_owned(),
            field_type,
            label: key.to_owned(),
            placeholder: None,
            description: None,
            required: true,
            validation_rules: None,
            section: FieldSection::Documents,
            display_order,
            active: true,
        }
    }

    fn pdf_policy() -> UploadConfig {
        UploadConfig::new("resumes", 5 * 1024 * 1024, [".PDF"], ["application/pdf"])
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn active_fields_hide_inactive_and_follow_display_order() {
        let store = Arc::new(FakeCatalog::default());
        let service = service(store);
        for (key, order) in [("email", 2), ("first_name", 1), ("legacy", 0)] {
            service
                .save_field(&admin(), input(key, FieldType::Text, order))
                .await
                .unwrap_or_else(|_| unreachable!());
        }
        service
            .set_field_active(&admin(), "legacy", false)
            .await
            .unwrap_or_else(|_| unreachable!());

        let keys: Vec<String> = service
            .active_fields()
            .await
            .unwrap_or_else(|_| unreachable!())
            .iter()
            .map(|field| field.key().to_owned())
            .collect();
        assert_eq!(keys, vec!["first_name", "email"]);

        let all = service
            .list_fields(&admin())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn upload_policy_requires_a_file_field() {
        let store = Arc::new(FakeCatalog::default());
        let service = service(store.clone());
        service
            .save_field(&admin(), input("email", FieldType::Email, 0))
            .await
            .unwrap_or_else(|_| unreachable!());
        service
            .save_field(&admin(), input("cv", FieldType::File, 1))
            .await
            .unwrap_or_else(|_| unreachable!());

        let on_email = service
            .save_upload_config(&admin(), "email", pdf_policy())
            .await;
        assert!(matches!(on_email, Err(AppError::Validation(_))));

        let on_missing = service
            .save_upload_config(&admin(), "portfolio", pdf_policy())
            .await;
        assert!(matches!(on_missing, Err(AppError::NotFound(_))));

        service
            .save_upload_config(&admin(), "cv", pdf_policy())
            .await
            .unwrap_or_else(|_| unreachable!());
        let configs = service
            .list_upload_configs(&admin())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(
            configs
                .get("cv")
                .is_some_and(|config| config.allowed_extensions().contains("pdf"))
        );

        let retyped = service
            .save_field(&admin(), input("cv", FieldType::Text, 1))
            .await;
        assert!(matches!(retyped, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn deleting_a_field_drops_its_policy() {
        let store = Arc::new(FakeCatalog::default());
        let service = service(store.clone());
        service
            .save_field(&admin(), input("cv", FieldType::File, 0))
            .await
            .unwrap_or_else(|_| unreachable!());
        service
            .save_upload_config(&admin(), "cv", pdf_policy())
            .await
            .unwrap_or_else(|_| unreachable!());

        service
            .delete_field(&admin(), "cv")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(store.configs.lock().await.is_empty());
        assert!(matches!(
            service.delete_field(&admin(), "cv").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_upload_config(&admin(), "cv").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn administration_requires_permissions() {
        let service = service(Arc::new(FakeCatalog::default()));
        let visitor = UserIdentity::new("visitor", "Visitor", None);

        assert!(matches!(
            service.list_fields(&visitor).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.list_upload_configs(&visitor).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(service.active_fields().await.is_ok());
    }
}
