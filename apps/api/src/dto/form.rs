use hirely_application::{normalize_phone, suggest_email_correction};
use hirely_domain::{
    Draft, DraftFile, FieldDefinition, InputKind, Submission, UploadConfig, UploadState,
    ValidationRules, format_file_size,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// Optional per-field constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/validation-rules-dto.ts"
)]
pub struct ValidationRulesDto {
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub options: Vec<String>,
}

/// API representation of a form field.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/form-field-response.ts"
)]
pub struct FormFieldResponse {
    pub key: String,
    pub field_type: String,
    pub input_kind: String,
    pub html_type: Option<String>,
    pub label: String,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub validation_rules: Option<ValidationRulesDto>,
    pub section: String,
    pub display_order: i32,
    pub active: bool,
}

/// API representation of a per-field upload policy.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/upload-config-response.ts"
)]
pub struct UploadConfigResponse {
    pub field_key: String,
    pub bucket_name: String,
    #[ts(type = "number")]
    pub max_size_bytes: u64,
    pub max_size_label: String,
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

/// Upload state of one file field.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/upload-state-response.ts"
)]
pub struct UploadStateResponse {
    pub field_key: String,
    pub file_name: String,
    pub status: String,
    pub url: Option<String>,
    pub error_message: Option<String>,
}

/// File already stored for a draft.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/draft-file-response.ts"
)]
pub struct DraftFileResponse {
    pub field_key: String,
    pub url: String,
    pub file_name: String,
}

/// Saved draft of a form session.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/draft-response.ts"
)]
pub struct DraftResponse {
    #[ts(type = "Record<string, unknown>")]
    pub form_data: Map<String, Value>,
    pub uploaded_files: Vec<DraftFileResponse>,
    pub last_saved_at: String,
}

/// Everything a client needs to render or resume the form.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/form-session-response.ts"
)]
pub struct FormSessionResponse {
    pub fields: Vec<FormFieldResponse>,
    pub upload_configs: Vec<UploadConfigResponse>,
    pub files: Vec<UploadStateResponse>,
    pub draft: Option<DraftResponse>,
}

/// Incoming form values for draft saves and submission.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/form-values-request.ts"
)]
pub struct FormValuesRequest {
    #[ts(type = "Record<string, unknown>")]
    pub form_data: Map<String, Value>,
}

/// Raw inputs the applicant typed, checked for likely mistakes.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/input-suggestions-query.ts"
)]
pub struct InputSuggestionsQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Corrections offered to the applicant. Accepting them is optional.
#[derive(Debug, PartialEq, Eq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/input-suggestions-response.ts"
)]
pub struct InputSuggestionsResponse {
    pub email_suggestion: Option<String>,
    pub normalized_phone: Option<String>,
}

/// Acknowledgement returned after a successful submission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/submission-receipt-response.ts"
)]
pub struct SubmissionReceiptResponse {
    pub id: String,
    pub status: String,
    pub created_at: String,
}

impl From<ValidationRules> for ValidationRulesDto {
    fn from(value: ValidationRules) -> Self {
        Self {
            min: value.min,
            max: value.max,
            options: value.options,
        }
    }
}

impl From<ValidationRulesDto> for ValidationRules {
    fn from(value: ValidationRulesDto) -> Self {
        Self {
            min: value.min,
            max: value.max,
            options: value.options,
        }
    }
}

impl From<FieldDefinition> for FormFieldResponse {
    fn from(field: FieldDefinition) -> Self {
        let (input_kind, html_type) = match field.field_type().input_kind() {
            InputKind::Input { html_type } => ("input", Some(html_type.to_owned())),
            InputKind::TextArea => ("text_area", None),
            InputKind::Dropdown => ("dropdown", None),
            InputKind::FilePicker => ("file_picker", None),
        };

        Self {
            key: field.key().to_owned(),
            field_type: field.field_type().as_str().to_owned(),
            input_kind: input_kind.to_owned(),
            html_type,
            label: field.label().to_owned(),
            placeholder: field.placeholder().map(ToOwned::to_owned),
            description: field.description().map(ToOwned::to_owned),
            required: field.is_required(),
            validation_rules: field.validation_rules().cloned().map(ValidationRulesDto::from),
            section: field.section().as_str().to_owned(),
            display_order: field.display_order(),
            active: field.is_active(),
        }
    }
}

impl UploadConfigResponse {
    pub fn new(field_key: String, config: &UploadConfig) -> Self {
        Self {
            field_key,
            bucket_name: config.bucket_name().to_owned(),
            max_size_bytes: config.max_size_bytes(),
            max_size_label: format_file_size(config.max_size_bytes()),
            allowed_extensions: config.allowed_extensions().iter().cloned().collect(),
            allowed_mime_types: config.allowed_mime_types().iter().cloned().collect(),
        }
    }
}

impl UploadStateResponse {
    pub fn new(field_key: &str, state: &UploadState) -> Self {
        Self {
            field_key: field_key.to_owned(),
            file_name: state.file_name().to_owned(),
            status: state.status().as_str().to_owned(),
            url: state.url().map(ToOwned::to_owned),
            error_message: state.error_message().map(ToOwned::to_owned),
        }
    }
}

impl From<DraftFile> for DraftFileResponse {
    fn from(value: DraftFile) -> Self {
        Self {
            field_key: value.field_key,
            url: value.url,
            file_name: value.file_name,
        }
    }
}

impl From<Draft> for DraftResponse {
    fn from(value: Draft) -> Self {
        Self {
            form_data: value.form_data,
            uploaded_files: value
                .uploaded_files
                .into_iter()
                .map(DraftFileResponse::from)
                .collect(),
            last_saved_at: value.last_saved_at.to_rfc3339(),
        }
    }
}

impl From<&Submission> for SubmissionReceiptResponse {
    fn from(value: &Submission) -> Self {
        Self {
            id: value.id().to_string(),
            status: value.status().as_str().to_owned(),
            created_at: value.created_at().to_rfc3339(),
        }
    }
}

impl From<&InputSuggestionsQuery> for InputSuggestionsResponse {
    fn from(query: &InputSuggestionsQuery) -> Self {
        Self {
            email_suggestion: query.email.as_deref().and_then(suggest_email_correction),
            normalized_phone: query
                .phone
                .as_deref()
                .map(normalize_phone)
                .filter(|normalized| !normalized.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InputSuggestionsQuery, InputSuggestionsResponse};

    #[test]
    fn suggestions_cover_email_typos_and_phone_separators() {
        let response = InputSuggestionsResponse::from(&InputSuggestionsQuery {
            email: Some("ada@gmial.com".to_owned()),
            phone: Some("+33 (6) 12-34.56.78".to_owned()),
        });

        assert_eq!(response.email_suggestion.as_deref(), Some("ada@gmail.com"));
        assert_eq!(response.normalized_phone.as_deref(), Some("+33612345678"));
    }

    #[test]
    fn clean_inputs_get_no_email_suggestion() {
        let response = InputSuggestionsResponse::from(&InputSuggestionsQuery {
            email: Some("ada@example.com".to_owned()),
            phone: None,
        });

        assert_eq!(
            response,
            InputSuggestionsResponse {
                email_suggestion: None,
                normalized_phone: None,
            }
        );
    }
}
