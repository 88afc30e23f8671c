use std::collections::BTreeMap;

use chrono::Utc;
use hirely_application::{SubmissionListQuery, SubmissionRepository};
use hirely_core::AppError;
use hirely_domain::{NewSubmission, SubmissionStatus};
use serde_json::{Map, Value, json};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresSubmissionRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres submission repository tests: {error}");
    }

    Some(pool)
}

fn new_submission(cv_url: &str) -> NewSubmission {
    let mut form_data = Map::new();
    form_data.insert("email".to_owned(), json!("ada@example.com"));
    form_data.insert("first_name".to_owned(), Value::String("Ada".to_owned()));

    let mut files_data = BTreeMap::new();
    files_data.insert("cv".to_owned(), cv_url.to_owned());

    NewSubmission {
        form_data,
        files_data,
    }
}

#[tokio::test]
async fn inserted_submission_is_new_and_referenced() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresSubmissionRepository::new(pool);
    let cv_url = format!("https://files.test/resumes/{}.pdf", Uuid::new_v4());

    let created = repository
        .insert_submission(new_submission(cv_url.as_str()))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(created.status(), SubmissionStatus::New);
    assert!(created.history().is_empty());

    let found = repository
        .find_submission(created.id())
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| unreachable!());
    assert_eq!(found.form_data(), created.form_data());
    assert_eq!(found.files_data().get("cv"), Some(&cv_url));

    let referenced = repository.referenced_file_urls().await.unwrap_or_default();
    assert!(referenced.contains(&cv_url));
}

#[tokio::test]
async fn transition_appends_history_and_detects_stale_state() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresSubmissionRepository::new(pool);
    let created = repository
        .insert_submission(new_submission("https://files.test/resumes/a.pdf"))
        .await
        .unwrap_or_else(|_| unreachable!());
    let other = repository
        .insert_submission(new_submission("https://files.test/resumes/b.pdf"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let transition = created
        .plan_transition(
            SubmissionStatus::Accepted,
            "reviewer-1",
            Some("great fit".to_owned()),
            Utc::now(),
        )
        .unwrap_or_else(|_| unreachable!());
    let updated = repository
        .record_transition(created.id(), transition.clone())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(updated.status(), SubmissionStatus::Accepted);
    assert_eq!(updated.reviewed_by(), Some("reviewer-1"));
    assert_eq!(updated.history().len(), 1);
    assert_eq!(updated.history()[0].note.as_deref(), Some("great fit"));

    let stale = repository.record_transition(created.id(), transition).await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    let untouched = repository
        .find_submission(other.id())
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| unreachable!());
    assert_eq!(untouched.status(), SubmissionStatus::New);
    assert!(untouched.history().is_empty());

    let accepted = repository
        .list_submissions(SubmissionListQuery {
            status: Some(SubmissionStatus::Accepted),
            limit: 500,
            offset: 0,
        })
        .await
        .unwrap_or_default();
    assert!(accepted.iter().any(|submission| submission.id() == created.id()));
    assert!(accepted.iter().all(|submission| submission.status() == SubmissionStatus::Accepted));
}
