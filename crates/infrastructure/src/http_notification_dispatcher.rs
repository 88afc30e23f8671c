use async_trait::async_trait;
use hirely_application::{ApplicantNotification, NotificationDispatcher};
use hirely_core::{AppError, AppResult};
use reqwest::Client;

/// Posts applicant notifications as JSON to a notification endpoint.
#[derive(Clone)]
pub struct HttpNotificationDispatcher {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpNotificationDispatcher {
    /// Creates a dispatcher targeting `endpoint`.
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn notify(&self, notification: ApplicantNotification) -> AppResult<()> {
        let mut request = self.client.post(self.endpoint.as_str()).json(&notification);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|error| {
            AppError::Internal(format!("notification request failed: {error}"))
        })?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Internal(format!(
            "notification endpoint returned {status}: {body}"
        )))
    }
}
