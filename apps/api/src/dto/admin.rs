use serde::Deserialize;
use ts_rs::TS;

use super::form::ValidationRulesDto;

/// Incoming payload for field create/update.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-field-request.ts"
)]
pub struct SaveFieldRequest {
    pub field_type: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub validation_rules: Option<ValidationRulesDto>,
    pub section: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Incoming payload for showing or hiding a field.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/set-field-active-request.ts"
)]
pub struct SetFieldActiveRequest {
    pub active: bool,
}

/// Incoming payload for an upload policy.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-upload-config-request.ts"
)]
pub struct SaveUploadConfigRequest {
    pub bucket_name: String,
    #[ts(type = "number")]
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
    #[serde(default)]
    pub allowed_mime_types: Vec<String>,
}
