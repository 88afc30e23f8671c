mod notification;
mod repository;

pub use notification::{ApplicantNotification, NotificationDispatcher};
pub use repository::{SubmissionListQuery, SubmissionRepository};
