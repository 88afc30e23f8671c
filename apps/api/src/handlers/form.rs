use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use hirely_application::FileUploadOrchestrator;
use hirely_core::AppError;
use hirely_domain::CandidateFile;
use tower_sessions::Session;
use tracing::info;

use crate::dto::{
    DraftResponse, FormFieldResponse, FormSessionResponse, FormValuesRequest,
    InputSuggestionsQuery, InputSuggestionsResponse, SubmissionReceiptResponse,
    UploadConfigResponse, UploadStateResponse,
};
use crate::error::ApiResult;
use crate::form_session::FormSession;
use crate::state::AppState;

const FORM_SESSION_KEY: &str = "form_session_id";
pub const FILE_NAME_HEADER: &str = "x-file-name";

pub async fn active_fields_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<FormFieldResponse>>> {
    let fields = state
        .form_catalog_service
        .active_fields()
        .await?
        .into_iter()
        .map(FormFieldResponse::from)
        .collect();

    Ok(Json(fields))
}

pub async fn input_suggestions_handler(
    Query(query): Query<InputSuggestionsQuery>,
) -> Json<InputSuggestionsResponse> {
    Json(InputSuggestionsResponse::from(&query))
}

pub async fn open_form_session_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<FormSessionResponse>> {
    let session_id = match session
        .get::<String>(FORM_SESSION_KEY)
        .await
        .map_err(session_error)?
    {
        Some(session_id) => session_id,
        None => {
            let session_id = uuid::Uuid::new_v4().to_string();
            session
                .insert(FORM_SESSION_KEY, session_id.clone())
                .await
                .map_err(session_error)?;
            session_id
        }
    };

    let form_session = state.form_sessions.session(session_id.as_str()).await?;
    let fields = state
        .form_catalog_service
        .active_fields()
        .await?
        .into_iter()
        .map(FormFieldResponse::from)
        .collect();
    let draft = form_session.drafts().load().await?.map(DraftResponse::from);

    let mut orchestrator = form_session.orchestrator().await;
    orchestrator.reload_configs().await?;
    let upload_configs = upload_configs(&orchestrator);
    let files = upload_states(&orchestrator);

    Ok(Json(FormSessionResponse {
        fields,
        upload_configs,
        files,
        draft,
    }))
}

pub async fn add_file_handler(
    State(state): State<AppState>,
    session: Session,
    Path(field_key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<UploadStateResponse>> {
    let form_session = current_form_session(&state, &session).await?;

    let file_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Validation(format!("{FILE_NAME_HEADER} header is required")))?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");
    let file = CandidateFile::new(file_name, content_type, body.to_vec())?;

    let mut orchestrator = form_session.orchestrator().await;
    orchestrator.add_file(field_key.as_str(), file)?;
    let upload_state = orchestrator
        .state(field_key.as_str())
        .ok_or_else(|| AppError::Internal(format!("upload state for '{field_key}' vanished")))?;

    Ok(Json(UploadStateResponse::new(field_key.as_str(), upload_state)))
}

pub async fn remove_file_handler(
    State(state): State<AppState>,
    session: Session,
    Path(field_key): Path<String>,
) -> ApiResult<StatusCode> {
    let form_session = current_form_session(&state, &session).await?;

    if !form_session
        .orchestrator()
        .await
        .remove_file(field_key.as_str())
    {
        return Err(AppError::NotFound(format!("no file selected for '{field_key}'")).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_files_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<UploadStateResponse>>> {
    let form_session = current_form_session(&state, &session).await?;

    let mut orchestrator = form_session.orchestrator().await;
    orchestrator.upload_all_files().await?;

    Ok(Json(upload_states(&orchestrator)))
}

pub async fn list_files_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<UploadStateResponse>>> {
    let form_session = current_form_session(&state, &session).await?;
    let orchestrator = form_session.orchestrator().await;

    Ok(Json(upload_states(&orchestrator)))
}

pub async fn load_draft_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<DraftResponse>> {
    let form_session = current_form_session(&state, &session).await?;

    let draft = form_session
        .drafts()
        .load()
        .await?
        .ok_or_else(|| AppError::NotFound("no draft saved".to_owned()))?;

    Ok(Json(DraftResponse::from(draft)))
}

pub async fn save_draft_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<FormValuesRequest>,
) -> ApiResult<Json<DraftResponse>> {
    let form_session = current_form_session(&state, &session).await?;

    let orchestrator = form_session.orchestrator().await;
    form_session.record_values(payload.form_data.clone()).await;
    let draft = form_session
        .drafts()
        .save(payload.form_data, orchestrator.uploaded_file_metadata())
        .await?;
    drop(orchestrator);

    Ok(Json(DraftResponse::from(draft)))
}

pub async fn discard_draft_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<StatusCode> {
    let form_session = current_form_session(&state, &session).await?;

    let orchestrator = form_session.orchestrator().await;
    form_session.forget_values().await;
    form_session.drafts().clear().await?;
    drop(orchestrator);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_form_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<FormValuesRequest>,
) -> ApiResult<(StatusCode, Json<SubmissionReceiptResponse>)> {
    let form_session = current_form_session(&state, &session).await?;

    let submission = {
        let mut orchestrator = form_session.orchestrator().await;
        orchestrator.expire_uploads(form_session.upload_max_age());
        let submission = state
            .submission_coordinator
            .submit(&mut orchestrator, form_session.drafts(), payload.form_data)
            .await?;
        form_session.forget_values().await;
        submission
    };

    info!(submission_id = %submission.id(), "application submitted");
    Ok((
        StatusCode::CREATED,
        Json(SubmissionReceiptResponse::from(&submission)),
    ))
}

async fn current_form_session(
    state: &AppState,
    session: &Session,
) -> ApiResult<Arc<FormSession>> {
    let session_id = session
        .get::<String>(FORM_SESSION_KEY)
        .await
        .map_err(session_error)?
        .ok_or_else(|| AppError::NotFound("no form session is open".to_owned()))?;

    Ok(state.form_sessions.session(session_id.as_str()).await?)
}

fn upload_states(orchestrator: &FileUploadOrchestrator) -> Vec<UploadStateResponse> {
    orchestrator
        .states()
        .iter()
        .map(|(field_key, state)| UploadStateResponse::new(field_key.as_str(), state))
        .collect()
}

fn upload_configs(orchestrator: &FileUploadOrchestrator) -> Vec<UploadConfigResponse> {
    orchestrator
        .configs()
        .iter()
        .map(|(field_key, config)| UploadConfigResponse::new(field_key.clone(), config))
        .collect()
}

fn session_error(error: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("failed to access session: {error}"))
}
