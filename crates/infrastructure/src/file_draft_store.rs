use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hirely_application::DraftStore;
use hirely_core::{AppError, AppResult};
use sha2::{Digest, Sha256};

/// Draft store keeping one file per key in a directory.
///
/// Keys are hashed into file names so arbitrary session namespaces stay
/// filesystem-safe.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    directory: PathBuf,
}

impl FileDraftStore {
    /// Creates the directory if needed and returns a store rooted there.
    pub async fn open(directory: impl Into<PathBuf>) -> AppResult<Self> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to create draft directory '{}': {error}",
                directory.display()
            ))
        })?;

        Ok(Self { directory })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn item_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.directory.join(format!("{}.json", hex::encode(digest)))
    }
}

#[async_trait]
impl DraftStore for FileDraftStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        match tokio::fs::read_to_string(self.item_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AppError::Internal(format!(
                "failed to read draft '{key}': {error}"
            ))),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> AppResult<()> {
        let path = self.item_path(key);
        let staging = path.with_extension("json.tmp");

        tokio::fs::write(&staging, value).await.map_err(|error| {
            AppError::Internal(format!("failed to write draft '{key}': {error}"))
        })?;
        tokio::fs::rename(&staging, &path).await.map_err(|error| {
            AppError::Internal(format!("failed to store draft '{key}': {error}"))
        })
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        match tokio::fs::remove_file(self.item_path(key)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Internal(format!(
                "failed to remove draft '{key}': {error}"
            ))),
        }
    }
}
