use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hirely_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Stable submission identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Creates a random submission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SubmissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for SubmissionId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid submission id: {error}")))
    }
}

/// Review status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Freshly submitted, not yet looked at.
    New,
    /// Looked at by a reviewer.
    Reviewed,
    /// Kept for the final round.
    Shortlisted,
    /// Accepted.
    Accepted,
    /// Rejected.
    Rejected,
}

impl SubmissionStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Shortlisted => "shortlisted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether moving into this status notifies the applicant.
    #[must_use]
    pub fn notifies_applicant(&self) -> bool {
        !matches!(self, Self::New)
    }
}

impl FromStr for SubmissionStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(Self::New),
            "reviewed" => Ok(Self::Reviewed),
            "shortlisted" => Ok(Self::Shortlisted),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown submission status '{value}'"
            ))),
        }
    }
}

/// One immutable status history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Status before the change.
    pub from: SubmissionStatus,
    /// Status after the change.
    pub to: SubmissionStatus,
    /// Subject of the reviewer who made the change.
    pub actor: String,
    /// Optional reviewer note.
    pub note: Option<String>,
    /// When the change happened.
    pub at: DateTime<Utc>,
}

/// Payload for a submission that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    /// Validated form values.
    pub form_data: Map<String, Value>,
    /// Uploaded file URLs keyed by field key.
    pub files_data: BTreeMap<String, String>,
}

/// Stored candidacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    id: SubmissionId,
    form_data: Map<String, Value>,
    files_data: BTreeMap<String, String>,
    status: SubmissionStatus,
    created_at: DateTime<Utc>,
    reviewed_by: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    history: Vec<StatusTransition>,
}

/// Persisted submission columns used to rebuild a [`Submission`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionSnapshot {
    /// Identifier.
    pub id: SubmissionId,
    /// Form values.
    pub form_data: Map<String, Value>,
    /// File URLs.
    pub files_data: BTreeMap<String, String>,
    /// Current status.
    pub status: SubmissionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last reviewer subject.
    pub reviewed_by: Option<String>,
    /// Last review time.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Last reviewer note.
    pub notes: Option<String>,
    /// Status history, oldest first.
    pub history: Vec<StatusTransition>,
}

impl Submission {
    /// Creates a submission in the `new` status.
    #[must_use]
    pub fn create(id: SubmissionId, input: NewSubmission, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            form_data: input.form_data,
            files_data: input.files_data,
            status: SubmissionStatus::New,
            created_at,
            reviewed_by: None,
            reviewed_at: None,
            notes: None,
            history: Vec::new(),
        }
    }

    /// Rebuilds a submission from persisted columns.
    #[must_use]
    pub fn from_snapshot(snapshot: SubmissionSnapshot) -> Self {
        Self {
            id: snapshot.id,
            form_data: snapshot.form_data,
            files_data: snapshot.files_data,
            status: snapshot.status,
            created_at: snapshot.created_at,
            reviewed_by: snapshot.reviewed_by,
            reviewed_at: snapshot.reviewed_at,
            notes: snapshot.notes,
            history: snapshot.history,
        }
    }

    /// Builds the history entry for a status change without applying it.
    pub fn plan_transition(
        &self,
        to: SubmissionStatus,
        actor: &str,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> AppResult<StatusTransition> {
        if self.status == to {
            return Err(AppError::Validation(format!(
                "submission '{}' is already {}",
                self.id,
                to.as_str()
            )));
        }

        if actor.trim().is_empty() {
            return Err(AppError::Validation(
                "status changes require a reviewer".to_owned(),
            ));
        }

        let note = note.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(StatusTransition {
            from: self.status,
            to,
            actor: actor.to_owned(),
            note,
            at,
        })
    }

    /// Applies a planned transition and appends it to the history.
    pub fn apply_transition(&mut self, transition: StatusTransition) -> AppResult<()> {
        if transition.from != self.status {
            return Err(AppError::Conflict(format!(
                "submission '{}' changed status concurrently",
                self.id
            )));
        }

        self.status = transition.to;
        self.reviewed_by = Some(transition.actor.clone());
        self.reviewed_at = Some(transition.at);
        self.notes = transition.note.clone();
        self.history.push(transition);
        Ok(())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// Returns the form values.
    #[must_use]
    pub fn form_data(&self) -> &Map<String, Value> {
        &self.form_data
    }

    /// Returns uploaded file URLs keyed by field key.
    #[must_use]
    pub fn files_data(&self) -> &BTreeMap<String, String> {
        &self.files_data
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Returns the creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last reviewer subject.
    #[must_use]
    pub fn reviewed_by(&self) -> Option<&str> {
        self.reviewed_by.as_deref()
    }

    /// Returns the last review time.
    #[must_use]
    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    /// Returns the last reviewer note.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the status history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StatusTransition] {
        &self.history
    }

    /// Extracts applicant contact data from the conventional form keys.
    #[must_use]
    pub fn applicant_contact(&self) -> Option<ApplicantContact> {
        ApplicantContact::from_form_data(&self.form_data)
    }
}

/// Applicant name and address used for notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantContact {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
}

impl ApplicantContact {
    /// Form key holding the applicant email.
    pub const EMAIL_KEY: &'static str = "email";
    /// Form key holding the given name.
    pub const FIRST_NAME_KEY: &'static str = "first_name";
    /// Form key holding the family name.
    pub const LAST_NAME_KEY: &'static str = "last_name";

    /// Reads contact data from form values; `None` without an email.
    #[must_use]
    pub fn from_form_data(form_data: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| {
            form_data
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_owned()
        };

        let email = text(Self::EMAIL_KEY);
        if email.is_empty() {
            return None;
        }

        Some(Self {
            first_name: text(Self::FIRST_NAME_KEY),
            last_name: text(Self::LAST_NAME_KEY),
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use serde_json::{Map, json};

    use super::{
        ApplicantContact, NewSubmission, Submission, SubmissionId, SubmissionStatus,
    };

    fn submission() -> Submission {
        let mut form_data = Map::new();
        form_data.insert("email".to_owned(), json!(" ada@example.com "));
        form_data.insert("first_name".to_owned(), json!("Ada"));

        Submission::create(
            SubmissionId::new(),
            NewSubmission {
                form_data,
                files_data: BTreeMap::new(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_submissions_start_without_history() {
        let submission = submission();
        assert_eq!(submission.status(), SubmissionStatus::New);
        assert!(submission.history().is_empty());
        assert_eq!(submission.reviewed_by(), None);
    }

    #[test]
    fn transition_records_previous_status_and_note() {
        let mut submission = submission();
        let transition = submission
            .plan_transition(
                SubmissionStatus::Rejected,
                "reviewer-1",
                Some("  missing degree ".to_owned()),
                Utc::now(),
            )
            .unwrap_or_else(|_| unreachable!());
        assert!(submission.apply_transition(transition).is_ok());

        assert_eq!(submission.status(), SubmissionStatus::Rejected);
        assert_eq!(submission.history().len(), 1);
        assert_eq!(submission.history()[0].from, SubmissionStatus::New);
        assert_eq!(submission.notes(), Some("missing degree"));
        assert_eq!(submission.reviewed_by(), Some("reviewer-1"));
    }

    #[test]
    fn same_status_transition_is_rejected() {
        let submission = submission();
        let result =
            submission.plan_transition(SubmissionStatus::New, "reviewer-1", None, Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn stale_transition_is_a_conflict() {
        let mut submission = submission();
        let stale = submission
            .plan_transition(SubmissionStatus::Reviewed, "reviewer-1", None, Utc::now())
            .unwrap_or_else(|_| unreachable!());
        let first = stale.clone();
        assert!(submission.apply_transition(first).is_ok());
        assert!(submission.apply_transition(stale).is_err());
    }

    #[test]
    fn contact_requires_email() {
        let submission = submission();
        let contact = submission.applicant_contact();
        assert_eq!(
            contact,
            Some(ApplicantContact {
                first_name: "Ada".to_owned(),
                last_name: String::new(),
                email: "ada@example.com".to_owned(),
            })
        );
        assert_eq!(ApplicantContact::from_form_data(&Map::new()), None);
    }
}
