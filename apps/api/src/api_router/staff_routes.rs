use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};

use crate::handlers::{admin, submissions};
use crate::middleware;
use crate::state::AppState;

pub(super) fn build_staff_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/submissions",
            get(submissions::list_submissions_handler),
        )
        .route(
            "/api/submissions/{submission_id}",
            get(submissions::get_submission_handler),
        )
        .route(
            "/api/submissions/{submission_id}/status",
            post(submissions::change_status_handler),
        )
        .route("/api/admin/fields", get(admin::list_fields_handler))
        .route(
            "/api/admin/fields/{field_key}",
            put(admin::save_field_handler).delete(admin::delete_field_handler),
        )
        .route(
            "/api/admin/fields/{field_key}/active",
            put(admin::set_field_active_handler),
        )
        .route(
            "/api/admin/upload-configs",
            get(admin::list_upload_configs_handler),
        )
        .route(
            "/api/admin/upload-configs/{field_key}",
            put(admin::save_upload_config_handler).delete(admin::delete_upload_config_handler),
        )
        .route_layer(from_fn_with_state(
            app_state,
            middleware::require_gateway_identity,
        ))
}
