use std::str::FromStr;

use homestead_core::telemetry::DEFAULT_BACKUP_MAX_AGE_HOURS;

use crate::auth::jwt::JwtConfig;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// Everything except `DATABASE_URL` and `JWT_SECRET` has a default suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight requests to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Mount points reported by `GET /telemetry/disks` (default: `/`).
    pub disk_paths: Vec<String>,
    /// Age after which a successful backup counts as stale (default: `26`).
    pub backup_max_age_hours: i64,
    /// Resource samples older than this many days are pruned (default: `30`).
    pub resource_log_retention_days: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                    |
    /// | `DATABASE_URL`                | required                |
    /// | `JWT_SECRET`                  | required                |
    /// | `JWT_ACCESS_EXPIRY_MINS`      | `15`                    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`     | `7`                     |
    /// | `DISK_PATHS`                  | `/`                     |
    /// | `BACKUP_MAX_AGE_HOURS`        | `26`                    |
    /// | `RESOURCE_LOG_RETENTION_DAYS` | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 3000)?,
            cors_origins: list_var("CORS_ORIGINS", "http://localhost:5173"),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: parse_var("SHUTDOWN_TIMEOUT_SECS", 30)?,
            database_url: required_var("DATABASE_URL")?,
            jwt: JwtConfig::from_env()?,
            disk_paths: list_var("DISK_PATHS", "/"),
            backup_max_age_hours: parse_var("BACKUP_MAX_AGE_HOURS", DEFAULT_BACKUP_MAX_AGE_HOURS)?,
            resource_log_retention_days: parse_var("RESOURCE_LOG_RETENTION_DAYS", 30)?,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

pub(crate) fn required_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

pub(crate) fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn list_var(name: &str, default: &str) -> Vec<String> {
    split_list(&var_or(name, default))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
