use axum::Json;
use axum::extract::State;
use axum::http::{Method, Uri};
use hirely_core::AppError;
use tracing::warn;

use crate::dto::RouteWarningResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn route_warnings_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RouteWarningResponse>>> {
    if !state.dev_diagnostics {
        return Err(AppError::NotFound("route warnings are disabled".to_owned()).into());
    }

    let warnings = state
        .route_warnings
        .list()
        .await
        .into_iter()
        .map(RouteWarningResponse::from)
        .collect();

    Ok(Json(warnings))
}

/// Router fallback: records the unmatched route and answers 404.
pub async fn unmatched_route_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> ApiError {
    let path = uri.path();
    if !state.route_warnings.record(method.as_str(), path).await {
        warn!(method = %method, path, "route warning registry is full");
    }

    AppError::NotFound(format!("no route for {method} {path}")).into()
}
