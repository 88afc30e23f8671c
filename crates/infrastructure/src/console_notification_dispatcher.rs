//! Console notification dispatcher for development. Logs messages to tracing output.

use async_trait::async_trait;
use hirely_application::{ApplicantNotification, NotificationDispatcher};
use hirely_core::AppResult;
use tracing::info;

use crate::notification_template::render;

/// Development dispatcher that logs applicant notifications.
#[derive(Clone, Default)]
pub struct ConsoleNotificationDispatcher;

impl ConsoleNotificationDispatcher {
    /// Creates a new console dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationDispatcher for ConsoleNotificationDispatcher {
    async fn notify(&self, notification: ApplicantNotification) -> AppResult<()> {
        let rendered = render(&notification);
        info!(
            to = notification.email.as_str(),
            subject = rendered.subject.as_str(),
            "--- NOTIFICATION (console) ---\nTo: {}\nSubject: {}\n\n{}\n--- END NOTIFICATION ---",
            notification.email,
            rendered.subject,
            rendered.body
        );

        Ok(())
    }
}
