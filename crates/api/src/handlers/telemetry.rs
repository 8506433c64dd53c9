//! Handlers for home-server telemetry: disk usage, resource samples pushed
//! by the collector, and backup runs.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use homestead_core::error::CoreError;
use homestead_core::telemetry::{evaluate_backup, validate_percent, BackupOutcome};
use homestead_db::models::telemetry::{BackupStatus, CreateBackupRun, CreateResourceLog};
use homestead_db::repositories::TelemetryRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::HistoryParams;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::system::read_disks;

// ---------------------------------------------------------------------------
// Disks
// ---------------------------------------------------------------------------

/// GET /api/v1/telemetry/disks
///
/// Current usage of every configured mount point.
pub async fn disks(_auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let paths = state.config.disk_paths.clone();
    let usage = tokio::task::spawn_blocking(move || read_disks(&paths))
        .await
        .map_err(|e| AppError::InternalError(format!("Disk stats task failed: {e}")))?;

    Ok(Json(DataResponse { data: usage }))
}

// ---------------------------------------------------------------------------
// Resource logs
// ---------------------------------------------------------------------------

/// GET /api/v1/telemetry/resource-logs?host=&since=&limit=
pub async fn list_resource_logs(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit()?;
    let host = params.host.as_deref().map(str::trim).filter(|h| !h.is_empty());

    let logs = TelemetryRepo::list_resource_logs(&state.pool, host, params.since, limit).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// POST /api/v1/telemetry/resource-logs
pub async fn record_resource_log(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateResourceLog>,
) -> AppResult<impl IntoResponse> {
    if input.host.trim().is_empty() {
        return Err(CoreError::Validation("host must not be empty".into()).into());
    }
    validate_percent("cpu_percent", input.cpu_percent)?;
    validate_percent("memory_percent", input.memory_percent)?;
    if input.load_average.is_some_and(|l| !l.is_finite() || l < 0.0) {
        return Err(CoreError::Validation("load_average must be a non-negative number".into()).into());
    }

    let log = TelemetryRepo::insert_resource_log(&state.pool, &input).await?;
    tracing::debug!(host = %log.host, cpu = log.cpu_percent, "Resource sample recorded");

    Ok((StatusCode::CREATED, Json(DataResponse { data: log })))
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

/// GET /api/v1/telemetry/backups?name=&limit=
pub async fn list_backups(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit()?;
    let name = params.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let runs = TelemetryRepo::list_backup_runs(&state.pool, name, limit).await?;
    Ok(Json(DataResponse { data: runs }))
}

/// POST /api/v1/telemetry/backups
pub async fn record_backup(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBackupRun>,
) -> AppResult<impl IntoResponse> {
    let outcome = BackupOutcome::parse(&input.status)?;
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("name must not be empty".into()).into());
    }
    if input.finished_at < input.started_at {
        return Err(CoreError::Validation("finished_at must not precede started_at".into()).into());
    }

    let run = TelemetryRepo::insert_backup_run(&state.pool, outcome, &input).await?;
    tracing::info!(backup = %run.name, status = %run.status, "Backup run recorded");

    Ok((StatusCode::CREATED, Json(DataResponse { data: run })))
}

/// GET /api/v1/telemetry/backups/status
///
/// Latest run of each backup job, classified as healthy, stale or failing.
pub async fn backup_status(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let max_age = chrono::Duration::hours(state.config.backup_max_age_hours);
    let now = Utc::now();

    let rows = TelemetryRepo::latest_backups(&state.pool).await?;
    let mut statuses = Vec::with_capacity(rows.len());
    for row in rows {
        let (latest, last_success_at) = row.into_parts();
        let outcome = BackupOutcome::parse(&latest.status)?;
        statuses.push(BackupStatus {
            name: latest.name.clone(),
            health: evaluate_backup(outcome, latest.finished_at, now, max_age),
            latest,
            last_success_at,
        });
    }

    Ok(Json(DataResponse { data: statuses }))
}
