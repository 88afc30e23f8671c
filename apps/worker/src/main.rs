//! Hirely storage reconciliation worker.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use hirely_application::StorageReconciliationService;
use hirely_core::{AppError, AppResult};
use hirely_infrastructure::{
    HttpObjectStorage, HttpObjectStorageConfig, PostgresFormRepository,
    PostgresSubmissionRepository,
};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    storage_base_url: String,
    storage_api_key: String,
    interval_seconds: u64,
    grace_hours: u32,
    run_once: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let service = build_reconciliation_service(pool, &config);
    let grace_period = chrono::Duration::hours(i64::from(config.grace_hours));

    info!(
        interval_seconds = config.interval_seconds,
        grace_hours = config.grace_hours,
        run_once = config.run_once,
        "hirely-worker started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_seconds));
    loop {
        interval.tick().await;

        match service.sweep(grace_period).await {
            Ok(report) => info!(
                scanned = report.scanned,
                deleted = report.deleted,
                failed = report.failed,
                "storage sweep completed"
            ),
            Err(error) => warn!(error = %error, "storage sweep failed"),
        }

        if config.run_once {
            return Ok(());
        }
    }
}

fn build_reconciliation_service(
    pool: PgPool,
    config: &WorkerConfig,
) -> StorageReconciliationService {
    let storage = Arc::new(HttpObjectStorage::new(
        reqwest::Client::new(),
        HttpObjectStorageConfig {
            base_url: config.storage_base_url.clone(),
            api_key: config.storage_api_key.clone(),
        },
    ));

    StorageReconciliationService::new(
        storage,
        Arc::new(PostgresFormRepository::new(pool.clone())),
        Arc::new(PostgresSubmissionRepository::new(pool)),
    )
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let storage_base_url = required_env("STORAGE_BASE_URL")?;
        let storage_api_key = required_env("STORAGE_API_KEY")?;
        let interval_seconds = parse_env_u64("RECONCILE_INTERVAL_SECONDS", 3600)?;
        let grace_hours = parse_env_u32("RECONCILE_GRACE_HOURS", 24)?;
        let run_once = env::args().nth(1).as_deref() == Some("once");

        if interval_seconds == 0 {
            return Err(AppError::Validation(
                "RECONCILE_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if grace_hours == 0 {
            return Err(AppError::Validation(
                "RECONCILE_GRACE_HOURS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            storage_base_url,
            storage_api_key,
            interval_seconds,
            grace_hours,
            run_once,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
