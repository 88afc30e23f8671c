use std::sync::Arc;

use hirely_core::{AppError, AppResult, FieldViolation};
use hirely_domain::{ApplicantContact, FieldType, NewSubmission, Submission, UploadStatus};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::draft_service::DraftPersistence;
use crate::form_ports::FieldCatalogRepository;
use crate::form_schema::SchemaCache;
use crate::submission_ports::{ApplicantNotification, NotificationDispatcher, SubmissionRepository};
use crate::upload_orchestrator::FileUploadOrchestrator;


/// Validates, uploads, stores and confirms an application.
pub struct SubmissionCoordinator {
    catalog: Arc<dyn FieldCatalogRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    notifications: Arc<dyn NotificationDispatcher>,
    schema_cache: SchemaCache,
}

impl SubmissionCoordinator {
    /// Creates a coordinator.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn FieldCatalogRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        notifications: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            catalog,
            submissions,
            notifications,
            schema_cache: SchemaCache::new(),
        }
    }

    /// Submits one application.
    ///
    /// Nothing is stored unless every field validates and every file uploads.
    /// Files uploaded for a submission that fails to insert are deleted.
    /// Submitting twice creates two submissions.
    pub async fn submit(
        &self,
        orchestrator: &mut FileUploadOrchestrator,
        drafts: &DraftPersistence,
        form_values: Map<String, Value>,
    ) -> AppResult<Submission> {
        let fields = self.catalog.list_fields().await?;
        let schema = self.schema_cache.schema_for(&fields);

        let mut violations = Vec::new();
        let mut form_data = match schema.validate(&form_values) {
            Ok(normalized) => normalized,
            Err(found) => {
                violations.extend(found);
                Map::new()
            }
        };

        for field_key in schema.required_keys_of_type(FieldType::File) {
            if orchestrator.state(field_key).is_none() {
                violations.push(FieldViolation::new(
                    field_key,
                    "required",
                    "a file is required",
                ));
            }
        }
        // Failed uploads block the submit whether or not the field is required.
        for (field_key, state) in orchestrator.states() {
            if state.status() == UploadStatus::Error {
                violations.push(FieldViolation::new(
                    field_key.as_str(),
                    "upload",
                    "the previous upload failed, please pick the file again or remove it",
                ));
            }
        }

        if !violations.is_empty() {
            info!(violations = violations.len(), "submission rejected by validation");
            return Err(AppError::InvalidFields(violations));
        }

        let files_data = orchestrator.upload_all_files().await?;
        form_data.retain(|key, _| {
            !fields
                .iter()
                .any(|field| field.key() == key && field.field_type() == FieldType::File)
        });

        let submission = match self
            .submissions
            .insert_submission(NewSubmission {
                form_data,
                files_data,
            })
            .await
        {
            Ok(submission) => submission,
            Err(error) => {
                let deleted = orchestrator.rollback_all_uploads().await;
                warn!(error = %error, deleted, "submission insert failed, uploads rolled back");
                return Err(match error {
                    AppError::Conflict(_) | AppError::Forbidden(_) | AppError::Internal(_) => error,
                    other => AppError::Internal(other.to_string()),
                });
            }
        };

        info!(
            submission_id = %submission.id(),
            files = submission.files_data().len(),
            "submission recorded"
        );

        if let Err(error) = drafts.clear().await {
            warn!(
                submission_id = %submission.id(),
                error = %error,
                "failed to clear draft after submission"
            );
        }
        orchestrator.clear();

        if let Some(contact) = ApplicantContact::from_form_data(submission.form_data())
            && let Err(error) = self
                .notifications
                .notify(ApplicantNotification::confirmation(contact))
                .await
        {
            warn!(
                submission_id = %submission.id(),
                error = %error,
                "confirmation notification failed"
            );
        }

        Ok(submission)
    }
}
