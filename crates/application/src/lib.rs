//! Application services and ports for the recruitment form.

#![forbid(unsafe_code)]

mod authorization_service;
mod draft_service;
mod form_catalog_service;
mod form_ports;
mod form_schema;
mod reconciliation_service;
mod review_service;
mod submission_ports;
mod submission_service;
mod upload_orchestrator;

pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use draft_service::{
    AutosaveHandle, DEFAULT_AUTOSAVE_INTERVAL, DraftPersistence, DraftSnapshot,
};
pub use form_catalog_service::FormCatalogService;
pub use form_ports::{
    DraftStore, FieldCatalogRepository, ObjectStorage, StoredObject, UploadConfigRepository,
};
pub use form_schema::{
    FormSchema, SchemaCache, generate_schema, normalize_phone, suggest_email_correction,
};
pub use reconciliation_service::{ReconciliationReport, StorageReconciliationService};
pub use review_service::{MAX_PAGE_SIZE, SubmissionReviewService};
pub use submission_ports::{
    ApplicantNotification, NotificationDispatcher, SubmissionListQuery, SubmissionRepository,
};
pub use submission_service::SubmissionCoordinator;
pub use upload_orchestrator::FileUploadOrchestrator;
