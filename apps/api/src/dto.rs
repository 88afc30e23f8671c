mod admin;
mod common;
mod form;
mod submissions;

pub use admin::{SaveFieldRequest, SaveUploadConfigRequest, SetFieldActiveRequest};
pub use common::{HealthDependencyStatus, HealthResponse, RouteWarningResponse};
pub use form::{
    DraftFileResponse, DraftResponse, FormFieldResponse, FormSessionResponse, FormValuesRequest,
    InputSuggestionsQuery, InputSuggestionsResponse, SubmissionReceiptResponse,
    UploadConfigResponse, UploadStateResponse, ValidationRulesDto,
};
pub use submissions::{
    ChangeStatusRequest, ListSubmissionsQuery, StatusTransitionResponse, SubmissionResponse,
};
