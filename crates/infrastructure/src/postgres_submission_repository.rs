use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hirely_application::{SubmissionListQuery, SubmissionRepository};
use hirely_core::{AppError, AppResult};
use hirely_domain::{
    NewSubmission, StatusTransition, Submission, SubmissionId, SubmissionSnapshot,
    SubmissionStatus,
};

use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed submission store with status history.
#[derive(Clone)]
pub struct PostgresSubmissionRepository {
    pool: PgPool,
}

impl PostgresSubmissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_history(
        &self,
        ids: &[Uuid],
    ) -> AppResult<BTreeMap<Uuid, Vec<StatusTransition>>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT submission_id, from_status, to_status, actor, note, changed_at
            FROM submission_status_history
            WHERE submission_id = ANY($1)
            ORDER BY submission_id, id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load submission history: {error}"))
        })?;

        let mut history: BTreeMap<Uuid, Vec<StatusTransition>> = BTreeMap::new();
        for row in rows {
            let submission_id = row.submission_id;
            history
                .entry(submission_id)
                .or_default()
                .push(row.into_transition()?);
        }

        Ok(history)
    }
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: Uuid,
    form_data: Value,
    files_data: Value,
    status: String,
    created_at: DateTime<Utc>,
    reviewed_by: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}

impl SubmissionRow {
    fn into_submission(self, history: Vec<StatusTransition>) -> AppResult<Submission> {
        let id = self.id;
        let Value::Object(form_data) = self.form_data else {
            return Err(AppError::Internal(format!(
                "persisted submission '{id}' has non-object form data"
            )));
        };
        let files_data: BTreeMap<String, String> = serde_json::from_value(self.files_data)
            .map_err(|error| {
                AppError::Internal(format!(
                    "persisted submission '{id}' has invalid files data: {error}"
                ))
            })?;

        Ok(Submission::from_snapshot(SubmissionSnapshot {
            id: SubmissionId::from_uuid(id),
            form_data,
            files_data,
            status: decode_status(self.status.as_str())?,
            created_at: self.created_at,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            notes: self.notes,
            history,
        }))
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    submission_id: Uuid,
    from_status: String,
    to_status: String,
    actor: String,
    note: Option<String>,
    changed_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_transition(self) -> AppResult<StatusTransition> {
        Ok(StatusTransition {
            from: decode_status(self.from_status.as_str())?,
            to: decode_status(self.to_status.as_str())?,
            actor: self.actor,
            note: self.note,
            at: self.changed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StatusRow {
    status: String,
}

#[derive(Debug, FromRow)]
struct UrlRow {
    url: String,
}

#[async_trait]
impl SubmissionRepository for PostgresSubmissionRepository {
    async fn insert_submission(&self, submission: NewSubmission) -> AppResult<Submission> {
        let id = SubmissionId::new();
        let files_data = serde_json::to_value(&submission.files_data).map_err(|error| {
            AppError::Internal(format!("failed to encode files data: {error}"))
        })?;

        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO submissions (id, form_data, files_data, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, form_data, files_data, status, created_at,
                      reviewed_by, reviewed_at, notes
            "#,
        )
        .bind(id.as_uuid())
        .bind(Value::Object(submission.form_data))
        .bind(files_data)
        .bind(SubmissionStatus::New.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| persistence_error(error, "insert submission"))?;

        row.into_submission(Vec::new())
    }

    async fn find_submission(&self, id: SubmissionId) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, form_data, files_data, status, created_at,
                   reviewed_by, reviewed_at, notes
            FROM submissions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| persistence_error(error, "find submission"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut history = self.load_history(&[row.id]).await?;
        let entries = history.remove(&row.id).unwrap_or_default();
        row.into_submission(entries).map(Some)
    }

    async fn list_submissions(&self, query: SubmissionListQuery) -> AppResult<Vec<Submission>> {
        let limit = i64::try_from(query.limit)
            .map_err(|error| AppError::Validation(format!("invalid limit: {error}")))?;
        let offset = i64::try_from(query.offset)
            .map_err(|error| AppError::Validation(format!("invalid offset: {error}")))?;

        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, form_data, files_data, status, created_at,
                   reviewed_by, reviewed_at, notes
            FROM submissions
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.status.map(|status| status.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| persistence_error(error, "list submissions"))?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut history = self.load_history(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let entries = history.remove(&row.id).unwrap_or_default();
                row.into_submission(entries)
            })
            .collect()
    }

    async fn record_transition(
        &self,
        id: SubmissionId,
        transition: StatusTransition,
    ) -> AppResult<Submission> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start status transaction: {error}"))
        })?;

        let current = sqlx::query_as::<_, StatusRow>(
            "SELECT status FROM submissions WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| persistence_error(error, "lock submission"))?
        .ok_or_else(|| AppError::NotFound(format!("submission '{id}' does not exist")))?;

        if decode_status(current.status.as_str())? != transition.from {
            return Err(AppError::Conflict(format!(
                "submission '{id}' changed status concurrently"
            )));
        }

        sqlx::query(
            r#"
            UPDATE submissions
            SET status = $2, reviewed_by = $3, reviewed_at = $4, notes = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(transition.to.as_str())
        .bind(transition.actor.as_str())
        .bind(transition.at)
        .bind(transition.note.as_deref())
        .execute(&mut *transaction)
        .await
        .map_err(|error| persistence_error(error, "update submission status"))?;

        sqlx::query(
            r#"
            INSERT INTO submission_status_history (
                submission_id, from_status, to_status, actor, note, changed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .bind(transition.actor.as_str())
        .bind(transition.note.as_deref())
        .bind(transition.at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| persistence_error(error, "append status history"))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit status transaction: {error}"))
        })?;

        self.find_submission(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("submission '{id}' does not exist")))
    }

    async fn referenced_file_urls(&self) -> AppResult<BTreeSet<String>> {
        let rows = sqlx::query_as::<_, UrlRow>(
            r#"
            SELECT DISTINCT files.value AS url
            FROM submissions, jsonb_each_text(submissions.files_data) AS files
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| persistence_error(error, "list referenced files"))?;

        Ok(rows.into_iter().map(|row| row.url).collect())
    }
}

fn decode_status(value: &str) -> AppResult<SubmissionStatus> {
    SubmissionStatus::from_str(value).map_err(|error| {
        AppError::Internal(format!("persisted submission status is invalid: {error}"))
    })
}

fn persistence_error(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error {
        match database_error.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!("failed to {operation}: {database_error}"));
            }
            Some("42501") => {
                return AppError::Forbidden(format!("failed to {operation}: {database_error}"));
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

