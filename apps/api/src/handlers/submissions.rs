use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use hirely_application::SubmissionListQuery;
use hirely_core::UserIdentity;
use hirely_domain::{SubmissionId, SubmissionStatus};

use crate::dto::{ChangeStatusRequest, ListSubmissionsQuery, SubmissionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 50;

pub async fn list_submissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<ListSubmissionsQuery>,
) -> ApiResult<Json<Vec<SubmissionResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(SubmissionStatus::from_str)
        .transpose()?;

    let submissions = state
        .review_service
        .list_submissions(
            &user,
            SubmissionListQuery {
                status,
                limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
                offset: query.offset.unwrap_or(0),
            },
        )
        .await?
        .into_iter()
        .map(SubmissionResponse::from)
        .collect();

    Ok(Json(submissions))
}

pub async fn get_submission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(submission_id): Path<String>,
) -> ApiResult<Json<SubmissionResponse>> {
    let submission_id = SubmissionId::from_str(submission_id.as_str())?;
    let submission = state
        .review_service
        .get_submission(&user, submission_id)
        .await?;

    Ok(Json(SubmissionResponse::from(submission)))
}

pub async fn change_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(submission_id): Path<String>,
    Json(payload): Json<ChangeStatusRequest>,
) -> ApiResult<Json<SubmissionResponse>> {
    let submission_id = SubmissionId::from_str(submission_id.as_str())?;
    let status = SubmissionStatus::from_str(payload.status.as_str())?;
    let note = payload
        .note
        .map(|note| note.trim().to_owned())
        .filter(|note| !note.is_empty());

    let submission = state
        .review_service
        .change_status(&user, submission_id, status, note)
        .await?;

    Ok(Json(SubmissionResponse::from(submission)))
}
