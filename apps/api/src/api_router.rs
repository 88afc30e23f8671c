mod cors;
mod form_routes;
mod staff_routes;

use axum::Router;
use axum::routing::get;
use hirely_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::api_config::ApiConfig;
use crate::handlers;
use crate::state::AppState;

use self::cors::build_cors_layer;
use self::form_routes::build_form_routes;
use self::staff_routes::build_staff_routes;

pub fn build_router(
    app_state: AppState,
    config: &ApiConfig,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/dev/route-warnings",
            get(handlers::dev::route_warnings_handler),
        )
        .route(
            "/storage/{bucket}/{*path}",
            get(handlers::storage::stored_object_handler),
        )
        .merge(build_form_routes(app_state.clone(), config.max_upload_bytes))
        .merge(build_staff_routes(app_state.clone()))
        .fallback(handlers::dev::unmatched_route_handler)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config.frontend_url.as_str())?)
        .layer(session_layer)
        .with_state(app_state))
}
