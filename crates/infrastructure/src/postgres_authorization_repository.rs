use std::str::FromStr;

use async_trait::async_trait;

use hirely_application::AuthorizationRepository;
use hirely_core::{AppError, AppResult};
use hirely_domain::Permission;

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for subject permission lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grants a permission to a subject. Granting twice is a no-op.
    pub async fn grant_permission(&self, subject: &str, permission: Permission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subject_permissions (subject, permission)
            VALUES ($1, $2)
            ON CONFLICT (subject, permission) DO NOTHING
            "#,
        )
        .bind(subject)
        .bind(permission.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to grant permission: {error}")))?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    permission: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT permission
            FROM subject_permissions
            WHERE subject = $1
            ORDER BY permission
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Permission::from_str(row.permission.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{}' for subject '{subject}': {error}",
                        row.permission
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use hirely_application::AuthorizationRepository;
    use hirely_domain::Permission;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use super::PostgresAuthorizationRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    #[tokio::test]
    async fn granted_permissions_are_listed_once() {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let pool = match PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };
        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for authorization repository tests: {error}");
        }

        let repository = PostgresAuthorizationRepository::new(pool);
        let subject = format!("reviewer-{}", Uuid::new_v4());
        for _ in 0..2 {
            assert!(
                repository
                    .grant_permission(subject.as_str(), Permission::SubmissionRead)
                    .await
                    .is_ok()
            );
        }

        let permissions = repository
            .list_permissions_for_subject(subject.as_str())
            .await
            .unwrap_or_default();
        assert_eq!(permissions, vec![Permission::SubmissionRead]);
    }
}
