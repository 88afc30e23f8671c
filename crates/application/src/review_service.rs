use std::sync::Arc;

use chrono::Utc;
use hirely_core::{AppError, AppResult, UserIdentity};
use hirely_domain::{Permission, Submission, SubmissionId, SubmissionStatus};
use tracing::{info, warn};

use crate::authorization_service::AuthorizationService;
use crate::submission_ports::{
    ApplicantNotification, NotificationDispatcher, SubmissionListQuery, SubmissionRepository,
};

/// Largest page a reviewer listing returns.
pub const MAX_PAGE_SIZE: usize = 200;

/// Reviewer operations over stored submissions.
#[derive(Clone)]
pub struct SubmissionReviewService {
    authorization_service: AuthorizationService,
    submissions: Arc<dyn SubmissionRepository>,
    notifications: Arc<dyn NotificationDispatcher>,
}

impl SubmissionReviewService {
    /// Creates a review service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        submissions: Arc<dyn SubmissionRepository>,
        notifications: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            authorization_service,
            submissions,
            notifications,
        }
    }

    /// Lists submissions, newest first.
    pub async fn list_submissions(
        &self,
        actor: &UserIdentity,
        query: SubmissionListQuery,
    ) -> AppResult<Vec<Submission>> {
        self.authorization_service
            .require_permission(actor, Permission::SubmissionRead)
            .await?;

        if query.limit == 0 {
            return Err(AppError::Validation(
                "limit must be greater than zero".to_owned(),
            ));
        }

        self.submissions
            .list_submissions(SubmissionListQuery {
                limit: query.limit.min(MAX_PAGE_SIZE),
                ..query
            })
            .await
    }

    /// Returns one submission with its status history.
    pub async fn get_submission(
        &self,
        actor: &UserIdentity,
        id: SubmissionId,
    ) -> AppResult<Submission> {
        self.authorization_service
            .require_permission(actor, Permission::SubmissionRead)
            .await?;

        self.submissions
            .find_submission(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("submission '{id}' does not exist")))
    }

    /// Moves a submission to a new status and informs the applicant.
    ///
    /// Notification failures are logged; the status change stands.
    pub async fn change_status(
        &self,
        actor: &UserIdentity,
        id: SubmissionId,
        status: SubmissionStatus,
        note: Option<String>,
    ) -> AppResult<Submission> {
        self.authorization_service
            .require_permission(actor, Permission::SubmissionReview)
            .await?;

        let current = self
            .submissions
            .find_submission(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("submission '{id}' does not exist")))?;
        let transition = current.plan_transition(status, actor.subject(), note, Utc::now())?;
        let from = transition.from;

        let updated = self.submissions.record_transition(id, transition).await?;
        info!(
            submission_id = %id,
            from = from.as_str(),
            to = status.as_str(),
            actor = actor.subject(),
            "submission status changed"
        );

        if status.notifies_applicant() {
            match updated.applicant_contact() {
                Some(contact) => {
                    let notification = ApplicantNotification::status_update(
                        contact,
                        status,
                        updated.notes().map(str::to_owned),
                    );
                    if let Err(error) = self.notifications.notify(notification).await {
                        warn!(
                            submission_id = %id,
                            error = %error,
                            "status notification failed"
                        );
                    }
                }
                None => warn!(submission_id = %id, "submission has no applicant email to notify"),
            }
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashMap};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{Map, Value, json};
    use tokio::sync::Mutex;

    use hirely_core::{AppError, AppResult, UserIdentity};
    use hirely_domain::{
        NewSubmission, Permission, StatusTransition, Submission, SubmissionId, SubmissionStatus,
    };

    use crate::authorization_service::{AuthorizationRepository, AuthorizationService};
    use crate::submission_ports::{
        ApplicantNotification, NotificationDispatcher, SubmissionListQuery, SubmissionRepository,
    };

    use super::SubmissionReviewService;

    struct FakeAuthorizationRepository {
        grants: HashMap<String, Vec<Permission>>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
            Ok(self.grants.get(subject).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeSubmissions {
        stored: Mutex<BTreeMap<SubmissionId, Submission>>,
        last_query: Mutex<Option<SubmissionListQuery>>,
    }

    impl FakeSubmissions {
        async fn seed(&self, email: Option<&str>) -> SubmissionId {
            let mut form_data = Map::new();
            form_data.insert("first_name".to_owned(), json!("Ada"));
            form_data.insert("last_name".to_owned(), json!("Lovelace"));
            if let Some(email) = email {
                form_data.insert("email".to_owned(), Value::String(email.to_owned()));
            }

            let submission = Submission::create(
                SubmissionId::new(),
                NewSubmission {
                    form_data,
                    files_data: BTreeMap::new(),
                },
                Utc::now(),
            );
            let id = submission.id();
            self.stored.lock().await.insert(id, submission);
            id
        }
    }

    #[async_trait]
    impl SubmissionRepository for FakeSubmissions {
        async fn insert_submission(&self, _submission: NewSubmission) -> AppResult<Submission> {
            Err(AppError::Internal("not used".to_owned()))
        }

        async fn find_submission(&self, id: SubmissionId) -> AppResult<Option<Submission>> {
            Ok(self.stored.lock().await.get(&id).cloned())
        }

        async fn list_submissions(
            &self,
            query: SubmissionListQuery,
        ) -> AppResult<Vec<Submission>> {
            *self.last_query.lock().await = Some(query);
            Ok(self.stored.lock().await.values().cloned().collect())
        }

        async fn record_transition(
            &self,
            id: SubmissionId,
            transition: StatusTransition,
        ) -> AppResult<Submission> {
            let mut stored = self.stored.lock().await;
            let submission = stored
                .get_mut(&id)
                .ok_or_else(|| AppError::NotFound(id.to_string()))?;
            submission.apply_transition(transition)?;
            Ok(submission.clone())
        }

        async fn referenced_file_urls(&self) -> AppResult<BTreeSet<String>> {
            Ok(BTreeSet::new())
        }
    }

    #[derive(Default)]
    struct FakeNotifications {
        sent: Mutex<Vec<ApplicantNotification>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationDispatcher for FakeNotifications {
        async fn notify(&self, notification: ApplicantNotification) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Internal("relay down".to_owned()));
            }
            self.sent.lock().await.push(notification);
            Ok(())
        }
    }

    fn reviewer() -> UserIdentity {
        UserIdentity::new("alice", "Alice", None)
    }

    fn reader() -> UserIdentity {
        UserIdentity::new("bob", "Bob", None)
    }

    fn service(
        submissions: Arc<FakeSubmissions>,
        notifications: Arc<FakeNotifications>,
    ) -> SubmissionReviewService {
        let mut grants = HashMap::new();
        grants.insert(
            "alice".to_owned(),
            vec![Permission::SubmissionRead, Permission::SubmissionReview],
        );
        grants.insert("bob".to_owned(), vec![Permission::SubmissionRead]);

        SubmissionReviewService::new(
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository { grants })),
            submissions,
            notifications,
        )
    }

    #[tokio::test]
    async fn status_change_appends_one_history_entry() {
        let submissions = Arc::new(FakeSubmissions::default());
        let notifications = Arc::new(FakeNotifications::default());
        let target = submissions.seed(Some("ada@example.com")).await;
        let other = submissions.seed(Some("grace@example.com")).await;
        let service = service(submissions.clone(), notifications.clone());

        let updated = service
            .change_status(
                &reviewer(),
                target,
                SubmissionStatus::Shortlisted,
                Some("  strong profile ".to_owned()),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(updated.status(), SubmissionStatus::Shortlisted);
        assert_eq!(updated.reviewed_by(), Some("alice"));
        assert_eq!(updated.notes(), Some("strong profile"));
        assert_eq!(updated.history().len(), 1);
        assert_eq!(updated.history()[0].from, SubmissionStatus::New);
        assert_eq!(updated.history()[0].to, SubmissionStatus::Shortlisted);

        let untouched = submissions
            .find_submission(other)
            .await
            .unwrap_or_else(|_| unreachable!())
            .unwrap_or_else(|| unreachable!());
        assert_eq!(untouched.status(), SubmissionStatus::New);
        assert!(untouched.history().is_empty());

        let sent = notifications.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].status, Some(SubmissionStatus::Shortlisted));
        assert_eq!(sent[0].notes.as_deref(), Some("strong profile"));
    }

    #[tokio::test]
    async fn same_status_is_rejected() {
        let submissions = Arc::new(FakeSubmissions::default());
        let target = submissions.seed(Some("ada@example.com")).await;
        let service = service(submissions, Arc::new(FakeNotifications::default()));

        let result = service
            .change_status(&reviewer(), target, SubmissionStatus::New, None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn reading_permission_does_not_allow_review() {
        let submissions = Arc::new(FakeSubmissions::default());
        let target = submissions.seed(Some("ada@example.com")).await;
        let service = service(submissions.clone(), Arc::new(FakeNotifications::default()));

        let result = service
            .change_status(&reader(), target, SubmissionStatus::Rejected, None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(service.get_submission(&reader(), target).await.is_ok());
    }

    #[tokio::test]
    async fn notification_failure_keeps_status_change() {
        let submissions = Arc::new(FakeSubmissions::default());
        let target = submissions.seed(Some("ada@example.com")).await;
        let service = service(
            submissions.clone(),
            Arc::new(FakeNotifications {
                fail: true,
                ..FakeNotifications::default()
            }),
        );

        let updated = service
            .change_status(&reviewer(), target, SubmissionStatus::Rejected, None)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.status(), SubmissionStatus::Rejected);
    }

    #[tokio::test]
    async fn submission_without_email_is_still_reviewable() {
        let submissions = Arc::new(FakeSubmissions::default());
        let notifications = Arc::new(FakeNotifications::default());
        let target = submissions.seed(None).await;
        let service = service(submissions, notifications.clone());

        let updated = service
            .change_status(&reviewer(), target, SubmissionStatus::Reviewed, None)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.status(), SubmissionStatus::Reviewed);
        assert!(notifications.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn missing_submission_is_not_found() {
        let service = service(
            Arc::new(FakeSubmissions::default()),
            Arc::new(FakeNotifications::default()),
        );
        let result = service.get_submission(&reviewer(), SubmissionId::new()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn listing_caps_the_page_size() {
        let submissions = Arc::new(FakeSubmissions::default());
        submissions.seed(Some("ada@example.com")).await;
        let service = service(submissions.clone(), Arc::new(FakeNotifications::default()));

        let listed = service
            .list_submissions(
                &reader(),
                SubmissionListQuery {
                    status: None,
                    limit: 10_000,
                    offset: 0,
                },
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(listed.len(), 1);
        assert_eq!(
            submissions.last_query.lock().await.map(|query| query.limit),
            Some(super::MAX_PAGE_SIZE)
        );
    }
}
