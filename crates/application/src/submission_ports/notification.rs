use async_trait::async_trait;
use hirely_core::AppResult;
use hirely_domain::{ApplicantContact, SubmissionStatus};
use serde::Serialize;

/// Outbound message to an applicant.
///
/// Without a status the message confirms receipt of a new submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantNotification {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Recipient address.
    pub email: String,
    /// New review status, if this is a status update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmissionStatus>,
    /// Reviewer note shared with the applicant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ApplicantNotification {
    /// Creates a receipt confirmation.
    #[must_use]
    pub fn confirmation(contact: ApplicantContact) -> Self {
        Self {
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            status: None,
            notes: None,
        }
    }

    /// Creates a status update.
    #[must_use]
    pub fn status_update(
        contact: ApplicantContact,
        status: SubmissionStatus,
        notes: Option<String>,
    ) -> Self {
        Self {
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            status: Some(status),
            notes,
        }
    }

    /// Returns the recipient display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Port for fire-and-forget applicant notifications.
///
/// Callers log failures and never propagate them.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Sends one notification.
    async fn notify(&self, notification: ApplicantNotification) -> AppResult<()>;
}
