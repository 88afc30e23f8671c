use hirely_core::FieldViolation;
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    violations: Option<Vec<FieldViolationResponse>>,
}

impl ErrorResponse {
    pub(super) fn new(message: String, violations: Option<Vec<FieldViolationResponse>>) -> Self {
        Self {
            message,
            violations,
        }
    }
}

/// One failing form field.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/field-violation-response.ts"
)]
pub struct FieldViolationResponse {
    pub field: String,
    pub rule: String,
    pub message: String,
}

impl From<FieldViolation> for FieldViolationResponse {
    fn from(value: FieldViolation) -> Self {
        Self {
            field: value.field,
            rule: value.rule,
            message: value.message,
        }
    }
}
