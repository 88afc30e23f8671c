use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hirely_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::DraftFile;

/// Upload policy for one file field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    bucket_name: NonEmptyString,
    max_size_bytes: u64,
    allowed_extensions: BTreeSet<String>,
    allowed_mime_types: BTreeSet<String>,
}

impl UploadConfig {
    /// Creates a validated upload policy.
    ///
    /// Extensions are stored lowercase without a leading dot and MIME types
    /// are stored lowercase.
    pub fn new(
        bucket_name: impl Into<String>,
        max_size_bytes: u64,
        allowed_extensions: impl IntoIterator<Item = impl AsRef<str>>,
        allowed_mime_types: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> AppResult<Self> {
        if max_size_bytes == 0 {
            return Err(AppError::Validation(
                "max_size_bytes must be greater than zero".to_owned(),
            ));
        }

        let allowed_extensions: BTreeSet<String> = allowed_extensions
            .into_iter()
            .map(|extension| {
                extension
                    .as_ref()
                    .trim()
                    .trim_start_matches('.')
                    .to_ascii_lowercase()
            })
            .filter(|extension| !extension.is_empty())
            .collect();
        if allowed_extensions.is_empty() {
            return Err(AppError::Validation(
                "at least one allowed extension is required".to_owned(),
            ));
        }

        let allowed_mime_types: BTreeSet<String> = allowed_mime_types
            .into_iter()
            .map(|mime_type| mime_type.as_ref().trim().to_ascii_lowercase())
            .filter(|mime_type| !mime_type.is_empty())
            .collect();
        if allowed_mime_types.is_empty() {
            return Err(AppError::Validation(
                "at least one allowed MIME type is required".to_owned(),
            ));
        }

        Ok(Self {
            bucket_name: NonEmptyString::new(bucket_name)?,
            max_size_bytes,
            allowed_extensions,
            allowed_mime_types,
        })
    }

    /// Returns the storage bucket name.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        self.bucket_name.as_str()
    }

    /// Returns the maximum accepted file size.
    #[must_use]
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Returns accepted lowercase extensions.
    #[must_use]
    pub fn allowed_extensions(&self) -> &BTreeSet<String> {
        &self.allowed_extensions
    }

    /// Returns accepted MIME types.
    #[must_use]
    pub fn allowed_mime_types(&self) -> &BTreeSet<String> {
        &self.allowed_mime_types
    }

    /// Checks a candidate file against this policy.
    pub fn check(&self, file: &CandidateFile) -> AppResult<()> {
        let size = file.size_bytes();
        if size > self.max_size_bytes {
            return Err(AppError::Validation(format!(
                "file '{}' is too large: {} exceeds the {} limit",
                file.file_name(),
                format_file_size(size),
                format_file_size(self.max_size_bytes)
            )));
        }

        let accepted = || {
            self.allowed_extensions
                .iter()
                .map(|extension| format!(".{extension}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        match file.extension() {
            Some(extension) if self.allowed_extensions.contains(&extension) => {}
            _ => {
                return Err(AppError::Validation(format!(
                    "file '{}' has an unsupported extension; accepted: {}",
                    file.file_name(),
                    accepted()
                )));
            }
        }

        if !self
            .allowed_mime_types
            .contains(&file.content_type().to_ascii_lowercase())
        {
            return Err(AppError::Validation(format!(
                "file '{}' has unsupported type '{}'; accepted: {}",
                file.file_name(),
                file.content_type(),
                accepted()
            )));
        }

        Ok(())
    }
}

/// A file picked by an applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    file_name: NonEmptyString,
    content_type: String,
    bytes: Vec<u8>,
}

impl CandidateFile {
    /// Creates a candidate file.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> AppResult<Self> {
        Ok(Self {
            file_name: NonEmptyString::new(file_name)?,
            content_type: content_type.into().trim().to_owned(),
            bytes,
        })
    }

    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Returns the declared MIME type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Returns the file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Returns the lowercase extension derived from the file name.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        file_extension(self.file_name())
    }
}

/// Returns the lowercase suffix after the last dot, if any.
#[must_use]
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }

    Some(extension.to_ascii_lowercase())
}

/// Reads the upload time encoded as the `<unix-millis>-` prefix of a storage path.
#[must_use]
pub fn stored_at_from_path(path: &str) -> Option<DateTime<Utc>> {
    let (millis, _) = path.split_once('-')?;
    DateTime::from_timestamp_millis(millis.parse::<i64>().ok()?)
}

/// Formats a byte count with binary units, e.g. `5.0 MB`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}

/// Lifecycle status of one field's upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Picked and validated, not yet transferred.
    Pending,
    /// Transfer in progress.
    Uploading,
    /// Stored; URL and path are known.
    Success,
    /// Transfer failed.
    Error,
}

impl UploadStatus {
    /// Returns a stable value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Returns whether no further transition happens without user action.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl FromStr for UploadStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "uploading" => Ok(Self::Uploading),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            _ => Err(AppError::Validation(format!(
                "unknown upload status '{value}'"
            ))),
        }
    }
}

/// In-memory upload state for one field key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadState {
    file_name: String,
    file: Option<CandidateFile>,
    url: Option<String>,
    storage_path: Option<String>,
    status: UploadStatus,
    error_message: Option<String>,
}

impl UploadState {
    /// Creates a pending state for a freshly picked file.
    #[must_use]
    pub fn pending(file: CandidateFile) -> Self {
        Self {
            file_name: file.file_name().to_owned(),
            file: Some(file),
            url: None,
            storage_path: None,
            status: UploadStatus::Pending,
            error_message: None,
        }
    }

    /// Creates a success state from persisted draft metadata. File bytes are not recoverable.
    #[must_use]
    pub fn restored(entry: &DraftFile) -> Self {
        Self {
            file_name: entry.file_name.clone(),
            file: None,
            url: Some(entry.url.clone()),
            storage_path: Some(entry.path.clone()),
            status: UploadStatus::Success,
            error_message: None,
        }
    }

    /// Marks the transfer as started.
    pub fn mark_uploading(&mut self) -> AppResult<()> {
        if self.status.is_terminal() {
            return Err(AppError::Validation(format!(
                "upload for '{}' is already {}",
                self.file_name,
                self.status.as_str()
            )));
        }

        self.status = UploadStatus::Uploading;
        self.error_message = None;
        Ok(())
    }

    /// Marks the transfer as stored.
    pub fn mark_success(&mut self, url: String, storage_path: String) {
        self.status = UploadStatus::Success;
        self.url = Some(url);
        self.storage_path = Some(storage_path);
        self.error_message = None;
    }

    /// Marks the transfer as failed.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = UploadStatus::Error;
        self.url = None;
        self.storage_path = None;
        self.error_message = Some(message.into());
    }

    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Returns the picked file, absent for restored entries.
    #[must_use]
    pub fn file(&self) -> Option<&CandidateFile> {
        self.file.as_ref()
    }

    /// Returns the public URL once stored.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns the storage path once stored.
    #[must_use]
    pub fn storage_path(&self) -> Option<&str> {
        self.storage_path.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Returns the last failure reason.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Projects a stored entry into draft metadata.
    #[must_use]
    pub fn to_draft_file(&self, field_key: &str) -> Option<DraftFile> {
        if self.status != UploadStatus::Success {
            return None;
        }

        Some(DraftFile {
            field_key: field_key.to_owned(),
            url: self.url.clone()?,
            path: self.storage_path.clone()?,
            file_name: self.file_name.clone(),
        })
    }
}
