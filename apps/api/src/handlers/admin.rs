use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use hirely_core::UserIdentity;
use hirely_domain::{FieldDefinitionInput, FieldSection, FieldType, UploadConfig};

use crate::dto::{
    FormFieldResponse, SaveFieldRequest, SaveUploadConfigRequest, SetFieldActiveRequest,
    UploadConfigResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_fields_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<FormFieldResponse>>> {
    let fields = state
        .form_catalog_service
        .list_fields(&user)
        .await?
        .into_iter()
        .map(FormFieldResponse::from)
        .collect();

    Ok(Json(fields))
}

pub async fn save_field_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(field_key): Path<String>,
    Json(payload): Json<SaveFieldRequest>,
) -> ApiResult<Json<FormFieldResponse>> {
    let field = state
        .form_catalog_service
        .save_field(
            &user,
            FieldDefinitionInput {
                key: field_key,
                field_type: FieldType::from_str(payload.field_type.as_str())?,
                label: payload.label,
                placeholder: payload.placeholder,
                description: payload.description,
                required: payload.required,
                validation_rules: payload.validation_rules.map(Into::into),
                section: FieldSection::from_str(payload.section.as_str())?,
                display_order: payload.display_order,
                active: payload.active,
            },
        )
        .await?;

    Ok(Json(FormFieldResponse::from(field)))
}

pub async fn set_field_active_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(field_key): Path<String>,
    Json(payload): Json<SetFieldActiveRequest>,
) -> ApiResult<Json<FormFieldResponse>> {
    let field = state
        .form_catalog_service
        .set_field_active(&user, field_key.as_str(), payload.active)
        .await?;

    Ok(Json(FormFieldResponse::from(field)))
}

pub async fn delete_field_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(field_key): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .form_catalog_service
        .delete_field(&user, field_key.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_upload_configs_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<UploadConfigResponse>>> {
    let configs = state
        .form_catalog_service
        .list_upload_configs(&user)
        .await?
        .into_iter()
        .map(|(field_key, config)| UploadConfigResponse::new(field_key, &config))
        .collect();

    Ok(Json(configs))
}

pub async fn save_upload_config_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(field_key): Path<String>,
    Json(payload): Json<SaveUploadConfigRequest>,
) -> ApiResult<Json<UploadConfigResponse>> {
    let config = UploadConfig::new(
        payload.bucket_name,
        payload.max_size_bytes,
        &payload.allowed_extensions,
        &payload.allowed_mime_types,
    )?;

    state
        .form_catalog_service
        .save_upload_config(&user, field_key.as_str(), config.clone())
        .await?;

    Ok(Json(UploadConfigResponse::new(field_key, &config)))
}

pub async fn delete_upload_config_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(field_key): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .form_catalog_service
        .delete_upload_config(&user, field_key.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
