use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};

use crate::handlers::form;
use crate::middleware;
use crate::state::AppState;

pub(super) fn build_form_routes(app_state: AppState, max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/form/fields", get(form::active_fields_handler))
        .route("/api/form/suggestions", get(form::input_suggestions_handler))
        .route("/api/form/session", post(form::open_form_session_handler))
        .route(
            "/api/form/session/files",
            get(form::list_files_handler),
        )
        .route(
            "/api/form/session/files/upload",
            post(form::upload_files_handler),
        )
        .route(
            "/api/form/session/files/{field_key}",
            put(form::add_file_handler).delete(form::remove_file_handler),
        )
        .route(
            "/api/form/session/draft",
            get(form::load_draft_handler)
                .put(form::save_draft_handler)
                .delete(form::discard_draft_handler),
        )
        .route("/api/form/session/submit", post(form::submit_form_handler))
        .route_layer(from_fn_with_state(
            app_state,
            middleware::require_same_origin_for_mutations,
        ))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
