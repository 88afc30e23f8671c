use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use hirely_application::{SubmissionListQuery, SubmissionRepository};
use hirely_core::{AppError, AppResult};
use hirely_domain::{NewSubmission, StatusTransition, Submission, SubmissionId};
use tokio::sync::RwLock;

/// In-memory submission store.
#[derive(Debug, Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<HashMap<SubmissionId, Submission>>,
}

impl InMemorySubmissionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn insert_submission(&self, submission: NewSubmission) -> AppResult<Submission> {
        let created = Submission::create(SubmissionId::new(), submission, Utc::now());
        self.submissions
            .write()
            .await
            .insert(created.id(), created.clone());
        Ok(created)
    }

    async fn find_submission(&self, id: SubmissionId) -> AppResult<Option<Submission>> {
        Ok(self.submissions.read().await.get(&id).cloned())
    }

    async fn list_submissions(&self, query: SubmissionListQuery) -> AppResult<Vec<Submission>> {
        let submissions = self.submissions.read().await;
        let mut listed: Vec<Submission> = submissions
            .values()
            .filter(|submission| {
                query
                    .status
                    .is_none_or(|status| submission.status() == status)
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| left.id().cmp(&right.id()))
        });

        Ok(listed
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn record_transition(
        &self,
        id: SubmissionId,
        transition: StatusTransition,
    ) -> AppResult<Submission> {
        let mut submissions = self.submissions.write().await;
        let submission = submissions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("submission '{id}' does not exist")))?;

        submission.apply_transition(transition)?;
        Ok(submission.clone())
    }

    async fn referenced_file_urls(&self) -> AppResult<BTreeSet<String>> {
        Ok(self
            .submissions
            .read()
            .await
            .values()
            .flat_map(|submission| submission.files_data().values().cloned())
            .collect())
    }
}
