//! SMTP notification dispatcher using the `lettre` crate.

use async_trait::async_trait;
use hirely_application::{ApplicantNotification, NotificationDispatcher};
use hirely_core::{AppError, AppResult};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::notification_template::render;

/// SMTP relay configuration.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

/// Sends applicant notifications as plain-text email.
#[derive(Clone)]
pub struct SmtpNotificationDispatcher {
    config: SmtpConfig,
}

impl SmtpNotificationDispatcher {
    /// Creates a new SMTP dispatcher.
    #[must_use]
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NotificationDispatcher for SmtpNotificationDispatcher {
    async fn notify(&self, notification: ApplicantNotification) -> AppResult<()> {
        let rendered = render(&notification);

        let from = self
            .config
            .from_address
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid from address: {error}")))?;
        let address = notification
            .email
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid recipient address: {error}")))?;
        let display_name = notification.full_name();
        let to = Mailbox::new((!display_name.is_empty()).then_some(display_name), address);

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(rendered.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(rendered.body)
            .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send email: {error}")))?;

        Ok(())
    }
}
