use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use hirely_core::{AppError, AppResult};
use hirely_domain::{
    CandidateFile, DraftFile, UploadConfig, UploadState, UploadStatus, stored_at_from_path,
};
use tracing::{debug, info, warn};

use crate::form_ports::{ObjectStorage, UploadConfigRepository};

#[cfg(test)]
mod tests;

/// Per-session state machine for candidate file uploads.
///
/// One orchestrator belongs to exactly one form session and is never shared.
pub struct FileUploadOrchestrator {
    storage: Arc<dyn ObjectStorage>,
    config_repository: Arc<dyn UploadConfigRepository>,
    configs: BTreeMap<String, UploadConfig>,
    states: BTreeMap<String, UploadState>,
}

impl FileUploadOrchestrator {
    /// Creates an orchestrator with no upload policies loaded.
    #[must_use]
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        config_repository: Arc<dyn UploadConfigRepository>,
    ) -> Self {
        Self {
            storage,
            config_repository,
            configs: BTreeMap::new(),
            states: BTreeMap::new(),
        }
    }

    /// Loads upload policies from the config store.
    pub async fn load_configs(&mut self) -> AppResult<()> {
        self.configs = self.config_repository.list_upload_configs().await?;
        debug!(count = self.configs.len(), "loaded upload configs");
        Ok(())
    }

    /// Reloads upload policies. Existing upload states are kept.
    pub async fn reload_configs(&mut self) -> AppResult<()> {
        self.load_configs().await
    }

    /// Returns the policy for a field key.
    #[must_use]
    pub fn config(&self, field_key: &str) -> Option<&UploadConfig> {
        self.configs.get(field_key)
    }

    /// Returns all loaded upload policies keyed by field.
    #[must_use]
    pub fn configs(&self) -> &BTreeMap<String, UploadConfig> {
        &self.configs
    }

    /// Returns the state for a field key.
    #[must_use]
    pub fn state(&self, field_key: &str) -> Option<&UploadState> {
        self.states.get(field_key)
    }

    /// Returns every upload state keyed by field key.
    #[must_use]
    pub fn states(&self) -> &BTreeMap<String, UploadState> {
        &self.states
    }

    /// Validates a picked file and stores it as pending, replacing any prior entry.
    ///
    /// On rejection the state is left unchanged.
    pub fn add_file(&mut self, field_key: &str, file: CandidateFile) -> AppResult<()> {
        let config = self.configs.get(field_key).ok_or_else(|| {
            AppError::Validation(format!("no upload policy configured for '{field_key}'"))
        })?;
        config.check(&file)?;

        self.states
            .insert(field_key.to_owned(), UploadState::pending(file));
        Ok(())
    }

    /// Forgets the file for a field key. Stored objects are not deleted.
    pub fn remove_file(&mut self, field_key: &str) -> bool {
        self.states.remove(field_key).is_some()
    }

    /// Transfers the pending file for one field key and returns its public URL.
    pub async fn upload_file(&mut self, field_key: &str) -> AppResult<String> {
        let config = self.configs.get(field_key).cloned().ok_or_else(|| {
            AppError::Validation(format!("no upload policy configured for '{field_key}'"))
        })?;
        let state = self.states.get_mut(field_key).ok_or_else(|| {
            AppError::Validation(format!("no file selected for '{field_key}'"))
        })?;
        let file = state.file().cloned().ok_or_else(|| {
            AppError::Validation(format!("file for '{field_key}' is no longer available"))
        })?;
        state.mark_uploading()?;

        let result = match storage_path(&file) {
            Ok(path) => self
                .storage
                .put_object(
                    config.bucket_name(),
                    path.as_str(),
                    file.bytes(),
                    file.content_type(),
                )
                .await
                .map(|url| (url, path)),
            Err(error) => Err(error),
        };

        let state = self.states.get_mut(field_key).ok_or_else(|| {
            AppError::Internal(format!("upload state for '{field_key}' disappeared"))
        })?;
        match result {
            Ok((url, path)) => {
                info!(
                    field_key,
                    bucket = config.bucket_name(),
                    path = path.as_str(),
                    "file uploaded"
                );
                state.mark_success(url.clone(), path);
                Ok(url)
            }
            Err(error) => {
                let message = match &error {
                    AppError::Upload { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                warn!(field_key, error = %error, "file upload failed");
                state.mark_failed(message.clone());
                Err(AppError::Upload {
                    field_key: field_key.to_owned(),
                    message,
                })
            }
        }
    }

    /// Uploads every pending file, stopping at the first failure.
    ///
    /// Entries uploaded before a failure stay in the success state. Returns
    /// the URL of every success entry, including ones uploaded earlier.
    pub async fn upload_all_files(&mut self) -> AppResult<BTreeMap<String, String>> {
        let pending: Vec<String> = self
            .states
            .iter()
            .filter(|(_, state)| state.status() == UploadStatus::Pending)
            .map(|(field_key, _)| field_key.clone())
            .collect();

        for field_key in pending {
            self.upload_file(field_key.as_str()).await?;
        }

        Ok(self.uploaded_urls())
    }

    /// Deletes every stored object and clears all entries. Never fails.
    ///
    /// Returns the number of objects deleted.
    pub async fn rollback_all_uploads(&mut self) -> usize {
        let mut deleted = 0;

        for (field_key, state) in &self.states {
            if state.status() != UploadStatus::Success {
                continue;
            }
            let Some(path) = state.storage_path() else {
                continue;
            };
            let Some(config) = self.configs.get(field_key) else {
                warn!(
                    field_key = field_key.as_str(),
                    path, "cannot roll back upload without an upload policy"
                );
                continue;
            };

            match self
                .storage
                .delete_object(config.bucket_name(), path)
                .await
            {
                Ok(()) => deleted += 1,
                Err(error) => warn!(
                    field_key = field_key.as_str(),
                    path,
                    error = %error,
                    "failed to roll back uploaded file"
                ),
            }
        }

        self.states.clear();
        deleted
    }

    /// Rehydrates success entries from draft metadata without re-uploading.
    pub fn restore_uploaded_files(&mut self, entries: &[DraftFile]) {
        for entry in entries {
            self.states
                .insert(entry.field_key.clone(), UploadState::restored(entry));
        }
    }

    /// Drops success entries stored longer ago than `max_age` and returns their keys.
    ///
    /// Objects that old may already be gone from storage. Entries whose path
    /// carries no readable upload time are dropped as well.
    pub fn expire_uploads(&mut self, max_age: TimeDelta) -> Vec<String> {
        let cutoff = Utc::now() - max_age;
        let expired: Vec<String> = self
            .states
            .iter()
            .filter(|(_, state)| state.status() == UploadStatus::Success)
            .filter(|(_, state)| {
                state
                    .storage_path()
                    .and_then(stored_at_from_path)
                    .is_none_or(|stored_at| stored_at < cutoff)
            })
            .map(|(field_key, _)| field_key.clone())
            .collect();

        for field_key in &expired {
            self.states.remove(field_key);
        }
        if !expired.is_empty() {
            info!(fields = ?expired, "expired uploads dropped");
        }
        expired
    }

    /// Returns draft metadata for every success entry.
    #[must_use]
    pub fn uploaded_file_metadata(&self) -> Vec<DraftFile> {
        self.states
            .iter()
            .filter_map(|(field_key, state)| state.to_draft_file(field_key))
            .collect()
    }

    /// Returns public URLs of every success entry.
    #[must_use]
    pub fn uploaded_urls(&self) -> BTreeMap<String, String> {
        self.states
            .iter()
            .filter(|(_, state)| state.status() == UploadStatus::Success)
            .filter_map(|(field_key, state)| {
                state.url().map(|url| (field_key.clone(), url.to_owned()))
            })
            .collect()
    }

    /// Drops every entry without touching storage.
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

/// Builds `<unix-millis>-<random hex>.<ext>`, independent of the original name.
fn storage_path(file: &CandidateFile) -> AppResult<String> {
    use std::fmt::Write;

    let extension = file.extension().ok_or_else(|| {
        AppError::Validation(format!("file '{}' has no extension", file.file_name()))
    })?;

    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate storage path: {error}")))?;
    let suffix = bytes
        .iter()
        .fold(String::with_capacity(16), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        });

    Ok(format!(
        "{}-{suffix}.{extension}",
        Utc::now().timestamp_millis()
    ))
}
