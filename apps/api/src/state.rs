use std::sync::Arc;

use hirely_application::{FormCatalogService, SubmissionCoordinator, SubmissionReviewService};
use hirely_infrastructure::InMemoryObjectStorage;
use sqlx::PgPool;

use crate::form_session::FormSessionRegistry;
use crate::route_warnings::WarningRegistry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub form_catalog_service: FormCatalogService,
    pub review_service: SubmissionReviewService,
    pub submission_coordinator: Arc<SubmissionCoordinator>,
    pub form_sessions: FormSessionRegistry,
    pub route_warnings: WarningRegistry,
    /// Set when uploads are kept in process memory and served under `/storage`.
    pub local_objects: Option<Arc<InMemoryObjectStorage>>,
    pub postgres_pool: PgPool,
    pub frontend_url: String,
    pub gateway_shared_secret: String,
    pub dev_diagnostics: bool,
}
