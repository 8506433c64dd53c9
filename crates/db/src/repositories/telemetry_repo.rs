//! Repository for `resource_logs` and `backup_runs`.

use homestead_core::telemetry::BackupOutcome;
use homestead_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::telemetry::{
    BackupRun, CreateBackupRun, CreateResourceLog, LatestBackupRow, ResourceLog,
};

const LOG_COLUMNS: &str = "id, host, cpu_percent, memory_percent, load_average, recorded_at";

const BACKUP_COLUMNS: &str = "id, name, status, started_at, finished_at, size_bytes, message";

pub struct TelemetryRepo;

impl TelemetryRepo {
    // -----------------------------------------------------------------------
    // Resource logs
    // -----------------------------------------------------------------------

    pub async fn insert_resource_log(
        pool: &PgPool,
        input: &CreateResourceLog,
    ) -> Result<ResourceLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO resource_logs (host, cpu_percent, memory_percent, load_average, recorded_at) \
             VALUES ($1, $2, $3, $4, COALESCE($5, NOW())) \
             RETURNING {LOG_COLUMNS}"
        );
        sqlx::query_as::<_, ResourceLog>(&query)
            .bind(input.host.trim())
            .bind(input.cpu_percent)
            .bind(input.memory_percent)
            .bind(input.load_average)
            .bind(input.recorded_at)
            .fetch_one(pool)
            .await
    }

    /// Most recent samples first, optionally for one host and after `since`.
    pub async fn list_resource_logs(
        pool: &PgPool,
        host: Option<&str>,
        since: Option<Timestamp>,
        limit: i64,
    ) -> Result<Vec<ResourceLog>, sqlx::Error> {
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM resource_logs \
             WHERE ($1::TEXT IS NULL OR host = $1) \
               AND ($2::TIMESTAMPTZ IS NULL OR recorded_at >= $2) \
             ORDER BY recorded_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, ResourceLog>(&query)
            .bind(host)
            .bind(since)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Delete samples recorded before `cutoff`. Returns the number deleted.
    pub async fn prune_resource_logs(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resource_logs WHERE recorded_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Backups
    // -----------------------------------------------------------------------

    pub async fn insert_backup_run(
        pool: &PgPool,
        outcome: BackupOutcome,
        input: &CreateBackupRun,
    ) -> Result<BackupRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO backup_runs (name, status, started_at, finished_at, size_bytes, message) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {BACKUP_COLUMNS}"
        );
        sqlx::query_as::<_, BackupRun>(&query)
            .bind(input.name.trim())
            .bind(outcome.as_str())
            .bind(input.started_at)
            .bind(input.finished_at)
            .bind(input.size_bytes)
            .bind(&input.message)
            .fetch_one(pool)
            .await
    }

    /// Backup history, newest first, optionally for one job name.
    pub async fn list_backup_runs(
        pool: &PgPool,
        name: Option<&str>,
        limit: i64,
    ) -> Result<Vec<BackupRun>, sqlx::Error> {
        let query = format!(
            "SELECT {BACKUP_COLUMNS} FROM backup_runs \
             WHERE ($1::TEXT IS NULL OR name = $1) \
             ORDER BY finished_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, BackupRun>(&query)
            .bind(name)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Latest run of every backup job plus when it last succeeded.
    pub async fn latest_backups(pool: &PgPool) -> Result<Vec<LatestBackupRow>, sqlx::Error> {
        sqlx::query_as::<_, LatestBackupRow>(
            "SELECT DISTINCT ON (b.name) \
                    b.id, b.name, b.status, b.started_at, b.finished_at, b.size_bytes, b.message, \
                    (SELECT MAX(s.finished_at) FROM backup_runs s \
                      WHERE s.name = b.name AND s.status = 'success') AS last_success_at \
             FROM backup_runs b \
             ORDER BY b.name, b.finished_at DESC, b.id DESC",
        )
        .fetch_all(pool)
        .await
    }
}
