use std::str::FromStr;

use hirely_core::AppError;
use serde::{Deserialize, Serialize};

/// Permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading submissions.
    SubmissionRead,
    /// Allows changing submission status.
    SubmissionReview,
    /// Allows editing the form field catalog.
    FormCatalogManage,
    /// Allows editing per-field upload policies.
    FormUploadConfigManage,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmissionRead => "submission.read",
            Self::SubmissionReview => "submission.review",
            Self::FormCatalogManage => "form.catalog.manage",
            Self::FormUploadConfigManage => "form.upload_config.manage",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::SubmissionRead,
            Permission::SubmissionReview,
            Permission::FormCatalogManage,
            Permission::FormUploadConfigManage,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "submission.read" => Ok(Self::SubmissionRead),
            "submission.review" => Ok(Self::SubmissionReview),
            "form.catalog.manage" => Ok(Self::FormCatalogManage),
            "form.upload_config.manage" => Ok(Self::FormUploadConfigManage),
            _ => Err(AppError::Validation(format!(
                "unknown permission '{value}'"
            ))),
        }
    }
}
