use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;

use hirely_application::DEFAULT_AUTOSAVE_INTERVAL;
use hirely_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Kept below the worker's default reconciliation grace period of 24 hours.
const DEFAULT_UPLOAD_MAX_AGE_HOURS: i64 = 12;

#[derive(Debug, Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub enum NotificationProviderConfig {
    Console,
    Http {
        endpoint: String,
        api_key: Option<String>,
    },
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub enum StorageProviderConfig {
    /// Process-local storage; objects vanish on restart.
    Memory { public_base_url: String },
    Http { base_url: String, api_key: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub gateway_shared_secret: String,
    pub storage: StorageProviderConfig,
    pub notification_provider: NotificationProviderConfig,
    pub draft_store_dir: Option<PathBuf>,
    pub autosave_interval: Duration,
    pub upload_max_age: TimeDelta,
    pub max_upload_bytes: usize,
    pub dev_diagnostics: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let gateway_shared_secret = required_non_empty_env("GATEWAY_SHARED_SECRET")?;
        if gateway_shared_secret.len() < 32 {
            return Err(AppError::Validation(
                "GATEWAY_SHARED_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env_flag("SESSION_COOKIE_SECURE");
        let dev_diagnostics = env_flag("DEV_DIAGNOSTICS");

        let storage = match optional_env("STORAGE_BASE_URL") {
            Some(base_url) => {
                Url::parse(base_url.as_str()).map_err(|error| {
                    AppError::Validation(format!("invalid STORAGE_BASE_URL: {error}"))
                })?;
                StorageProviderConfig::Http {
                    base_url,
                    api_key: required_non_empty_env("STORAGE_API_KEY")?,
                }
            }
            None => StorageProviderConfig::Memory {
                public_base_url: format!("http://{api_host}:{api_port}/storage"),
            },
        };

        let notification_provider = match env::var("NOTIFICATION_PROVIDER")
            .unwrap_or_else(|_| "console".to_owned())
            .as_str()
        {
            "console" => NotificationProviderConfig::Console,
            "http" => {
                let endpoint = required_non_empty_env("NOTIFICATION_ENDPOINT")?;
                Url::parse(endpoint.as_str()).map_err(|error| {
                    AppError::Validation(format!("invalid NOTIFICATION_ENDPOINT: {error}"))
                })?;
                NotificationProviderConfig::Http {
                    endpoint,
                    api_key: optional_env("NOTIFICATION_API_KEY"),
                }
            }
            "smtp" => {
                let port = required_non_empty_env("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
                NotificationProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: required_non_empty_env("SMTP_HOST")?,
                    port,
                    username: required_non_empty_env("SMTP_USERNAME")?,
                    password: required_non_empty_env("SMTP_PASSWORD")?,
                    from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "NOTIFICATION_PROVIDER must be one of 'console', 'http' or 'smtp', got '{other}'"
                )));
            }
        };

        let draft_store_dir = optional_env("DRAFT_STORE_DIR").map(PathBuf::from);
        let autosave_interval = match optional_env("DRAFT_AUTOSAVE_SECONDS") {
            Some(value) => {
                let seconds = value.parse::<u64>().map_err(|error| {
                    AppError::Validation(format!("invalid DRAFT_AUTOSAVE_SECONDS: {error}"))
                })?;
                if seconds == 0 {
                    return Err(AppError::Validation(
                        "DRAFT_AUTOSAVE_SECONDS must be greater than zero".to_owned(),
                    ));
                }
                Duration::from_secs(seconds)
            }
            None => DEFAULT_AUTOSAVE_INTERVAL,
        };
        let upload_max_age = match optional_env("DRAFT_UPLOAD_MAX_AGE_HOURS") {
            Some(value) => {
                let hours = value.parse::<i64>().map_err(|error| {
                    AppError::Validation(format!("invalid DRAFT_UPLOAD_MAX_AGE_HOURS: {error}"))
                })?;
                if hours <= 0 {
                    return Err(AppError::Validation(
                        "DRAFT_UPLOAD_MAX_AGE_HOURS must be greater than zero".to_owned(),
                    ));
                }
                TimeDelta::hours(hours)
            }
            None => TimeDelta::hours(DEFAULT_UPLOAD_MAX_AGE_HOURS),
        };
        let max_upload_bytes = match optional_env("MAX_UPLOAD_BYTES") {
            Some(value) => value.parse::<usize>().map_err(|error| {
                AppError::Validation(format!("invalid MAX_UPLOAD_BYTES: {error}"))
            })?,
            None => 25 * 1024 * 1024,
        };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            gateway_shared_secret,
            storage,
            notification_provider,
            draft_store_dir,
            autosave_interval,
            upload_max_age,
            max_upload_bytes,
            dev_diagnostics,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true")
}
