use std::sync::Arc;

use hirely_application::{
    AuthorizationService, FormCatalogService, SubmissionCoordinator, SubmissionReviewService,
};
use hirely_core::AppError;
use hirely_infrastructure::{
    PostgresAuthorizationRepository, PostgresFormRepository, PostgresSubmissionRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::form_session::FormSessionRegistry;
use crate::route_warnings::WarningRegistry;
use crate::state::AppState;

use super::adapters::{build_draft_store, build_notification_dispatcher, build_object_storage};

pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let http_client = reqwest::Client::new();

    let form_repository = Arc::new(PostgresFormRepository::new(pool.clone()));
    let submission_repository = Arc::new(PostgresSubmissionRepository::new(pool.clone()));
    let authorization_service =
        AuthorizationService::new(Arc::new(PostgresAuthorizationRepository::new(pool.clone())));

    let (object_storage, local_objects) = build_object_storage(config, &http_client);
    let notifications = build_notification_dispatcher(config, &http_client);
    let draft_store = build_draft_store(config).await?;

    Ok(AppState {
        form_catalog_service: FormCatalogService::new(
            authorization_service.clone(),
            form_repository.clone(),
            form_repository.clone(),
        ),
        review_service: SubmissionReviewService::new(
            authorization_service,
            submission_repository.clone(),
            notifications.clone(),
        ),
        submission_coordinator: Arc::new(SubmissionCoordinator::new(
            form_repository.clone(),
            submission_repository,
            notifications,
        )),
        form_sessions: FormSessionRegistry::new(
            object_storage,
            form_repository,
            draft_store,
            config.autosave_interval,
            config.upload_max_age,
        ),
        route_warnings: WarningRegistry::new(),
        local_objects,
        postgres_pool: pool,
        frontend_url: config.frontend_url.clone(),
        gateway_shared_secret: config.gateway_shared_secret.clone(),
        dev_diagnostics: config.dev_diagnostics,
    })
}
