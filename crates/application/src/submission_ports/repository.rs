use std::collections::BTreeSet;

use async_trait::async_trait;
use hirely_core::AppResult;
use hirely_domain::{
    NewSubmission, StatusTransition, Submission, SubmissionId, SubmissionStatus,
};

/// Query inputs for reviewer submission listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionListQuery {
    /// Optional status filter.
    pub status: Option<SubmissionStatus>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

/// Repository port for durable submissions.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Inserts a new submission in the `new` status.
    ///
    /// Constraint violations map to `AppError::Conflict`, row-level permission
    /// denials to `AppError::Forbidden`, everything else to `AppError::Internal`.
    async fn insert_submission(&self, submission: NewSubmission) -> AppResult<Submission>;

    /// Looks up one submission with its history.
    async fn find_submission(&self, id: SubmissionId) -> AppResult<Option<Submission>>;

    /// Lists submissions, newest first.
    async fn list_submissions(&self, query: SubmissionListQuery) -> AppResult<Vec<Submission>>;

    /// Applies a status change and appends it to the history atomically.
    ///
    /// Fails with `AppError::Conflict` when the stored status no longer
    /// matches `transition.from`.
    async fn record_transition(
        &self,
        id: SubmissionId,
        transition: StatusTransition,
    ) -> AppResult<Submission>;

    /// Returns every file URL referenced by any stored submission.
    async fn referenced_file_urls(&self) -> AppResult<BTreeSet<String>>;
}
