//! Shared primitives for all Rust crates in Hirely.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::UserIdentity;

/// Result type used across Hirely crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field key that failed validation.
    pub field: String,
    /// Stable rule identifier, e.g. `required` or `format`.
    pub rule: String,
    /// Human-readable explanation.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation for one field.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl Display for FieldViolation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}: {}", self.field, self.message)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// One or more form fields failed validation.
    #[error("invalid fields: {}", format_violations(.0))]
    InvalidFields(Vec<FieldViolation>),

    /// Transfer of a file to object storage failed.
    #[error("upload failed for field '{field_key}': {message}")]
    Upload {
        /// Field key whose file failed to upload.
        field_key: String,
        /// Failure reason reported by the storage backend.
        message: String,
    },

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the message shown to end users for this error category.
    ///
    /// Detailed causes stay in logs; only constraint and permission failures
    /// are distinguished from generic failures, which invite a retry.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::InvalidFields(violations) => format!(
                "Please correct the following fields: {}",
                violations
                    .iter()
                    .map(|violation| violation.field.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Upload { field_key, .. } => {
                format!("The file for '{field_key}' could not be uploaded. Please try again.")
            }
            Self::NotFound(_) => "The requested resource was not found.".to_owned(),
            Self::Conflict(_) => "This application has already been recorded.".to_owned(),
            Self::Unauthorized(_) => "Please sign in to continue.".to_owned(),
            Self::Forbidden(_) => "You are not allowed to perform this action.".to_owned(),
            Self::Internal(_) => "Something went wrong. Please try again.".to_owned(),
        }
    }

    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::Upload { .. })
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::{AppError, FieldViolation, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_fields_lists_every_violation() {
        let error = AppError::InvalidFields(vec![
            FieldViolation::new("email", "format", "must be a valid email address"),
            FieldViolation::new("cv", "required", "file is required"),
        ]);

        assert_eq!(
            error.to_string(),
            "invalid fields: email: must be a valid email address; cv: file is required"
        );
        assert!(error.user_message().contains("email, cv"));
    }

    #[test]
    fn only_generic_failures_are_retryable() {
        assert!(AppError::Internal("network".to_owned()).is_retryable());
        assert!(!AppError::Conflict("duplicate".to_owned()).is_retryable());
        assert!(!AppError::Forbidden("rls".to_owned()).is_retryable());
    }
}
