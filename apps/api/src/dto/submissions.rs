use std::collections::BTreeMap;

use hirely_domain::{StatusTransition, Submission};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// Query string of the reviewer submission list.
#[derive(Debug, Default, Deserialize)]
pub struct ListSubmissionsQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Incoming payload for a status change.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-status-request.ts"
)]
pub struct ChangeStatusRequest {
    pub status: String,
    pub note: Option<String>,
}

/// One status history entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/status-transition-response.ts"
)]
pub struct StatusTransitionResponse {
    pub from: String,
    pub to: String,
    pub actor: String,
    pub note: Option<String>,
    pub at: String,
}

/// API representation of a stored submission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/submission-response.ts"
)]
pub struct SubmissionResponse {
    pub id: String,
    #[ts(type = "Record<string, unknown>")]
    pub form_data: Map<String, Value>,
    pub files_data: BTreeMap<String, String>,
    pub status: String,
    pub created_at: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub notes: Option<String>,
    pub history: Vec<StatusTransitionResponse>,
}

impl From<&StatusTransition> for StatusTransitionResponse {
    fn from(value: &StatusTransition) -> Self {
        Self {
            from: value.from.as_str().to_owned(),
            to: value.to.as_str().to_owned(),
            actor: value.actor.clone(),
            note: value.note.clone(),
            at: value.at.to_rfc3339(),
        }
    }
}

impl From<Submission> for SubmissionResponse {
    fn from(value: Submission) -> Self {
        Self {
            id: value.id().to_string(),
            form_data: value.form_data().clone(),
            files_data: value.files_data().clone(),
            status: value.status().as_str().to_owned(),
            created_at: value.created_at().to_rfc3339(),
            reviewed_by: value.reviewed_by().map(ToOwned::to_owned),
            reviewed_at: value.reviewed_at().map(|at| at.to_rfc3339()),
            notes: value.notes().map(ToOwned::to_owned),
            history: value
                .history()
                .iter()
                .map(StatusTransitionResponse::from)
                .collect(),
        }
    }
}
