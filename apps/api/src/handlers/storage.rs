use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use hirely_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Serves an object from process-local storage at the URL its upload returned.
pub async fn stored_object_handler(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let storage = state
        .local_objects
        .as_ref()
        .ok_or_else(|| AppError::NotFound("local storage is disabled".to_owned()))?;

    let object = storage
        .get_object(bucket.as_str(), path.as_str())
        .await
        .ok_or_else(|| AppError::NotFound(format!("object '{bucket}/{path}' does not exist")))?;

    Ok(([(CONTENT_TYPE, object.content_type)], object.bytes))
}
