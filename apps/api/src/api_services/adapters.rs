use std::sync::Arc;

use hirely_application::{DraftStore, NotificationDispatcher, ObjectStorage};
use hirely_core::AppError;
use hirely_infrastructure::{
    ConsoleNotificationDispatcher, FileDraftStore, HttpNotificationDispatcher, HttpObjectStorage,
    HttpObjectStorageConfig, InMemoryDraftStore, InMemoryObjectStorage, SmtpConfig,
    SmtpNotificationDispatcher,
};
use tracing::warn;

use crate::api_config::{ApiConfig, NotificationProviderConfig, StorageProviderConfig};

/// Returns the storage port and, for process-local storage, the store the API serves from.
pub(super) fn build_object_storage(
    config: &ApiConfig,
    http_client: &reqwest::Client,
) -> (Arc<dyn ObjectStorage>, Option<Arc<InMemoryObjectStorage>>) {
    match &config.storage {
        StorageProviderConfig::Http { base_url, api_key } => (
            Arc::new(HttpObjectStorage::new(
                http_client.clone(),
                HttpObjectStorageConfig {
                    base_url: base_url.clone(),
                    api_key: api_key.clone(),
                },
            )),
            None,
        ),
        StorageProviderConfig::Memory { public_base_url } => {
            warn!(
                public_base_url = public_base_url.as_str(),
                "STORAGE_BASE_URL is not set, uploaded files are kept in memory and served by the API"
            );
            let storage = Arc::new(InMemoryObjectStorage::new(public_base_url.clone()));
            (storage.clone(), Some(storage))
        }
    }
}

pub(super) fn build_notification_dispatcher(
    config: &ApiConfig,
    http_client: &reqwest::Client,
) -> Arc<dyn NotificationDispatcher> {
    match &config.notification_provider {
        NotificationProviderConfig::Console => Arc::new(ConsoleNotificationDispatcher::new()),
        NotificationProviderConfig::Http { endpoint, api_key } => Arc::new(
            HttpNotificationDispatcher::new(http_client.clone(), endpoint.clone(), api_key.clone()),
        ),
        NotificationProviderConfig::Smtp(smtp) => {
            Arc::new(SmtpNotificationDispatcher::new(SmtpConfig {
                host: smtp.host.clone(),
                port: smtp.port,
                username: smtp.username.clone(),
                password: smtp.password.clone(),
                from_address: smtp.from_address.clone(),
            }))
        }
    }
}

pub(super) async fn build_draft_store(config: &ApiConfig) -> Result<Arc<dyn DraftStore>, AppError> {
    let store: Arc<dyn DraftStore> = match &config.draft_store_dir {
        Some(directory) => Arc::new(FileDraftStore::open(directory.clone()).await?),
        None => Arc::new(InMemoryDraftStore::new()),
    };

    Ok(store)
}
