//! Resource samples and backup runs pushed by the home server.

use homestead_core::telemetry::BackupHealth;
use homestead_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `resource_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResourceLog {
    pub id: DbId,
    pub host: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub load_average: Option<f64>,
    pub recorded_at: Timestamp,
}

/// DTO for a resource sample. `recorded_at` defaults to the insert time.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateResourceLog {
    pub host: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub load_average: Option<f64>,
    pub recorded_at: Option<Timestamp>,
}

/// A row from the `backup_runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BackupRun {
    pub id: DbId,
    pub name: String,
    pub status: String,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub size_bytes: Option<i64>,
    pub message: Option<String>,
}

/// DTO for recording a finished backup run.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBackupRun {
    pub name: String,
    pub status: String,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub size_bytes: Option<i64>,
    pub message: Option<String>,
}

/// Latest state of one named backup job.
#[derive(Debug, Clone, Serialize)]
pub struct BackupStatus {
    pub name: String,
    pub health: BackupHealth,
    pub latest: BackupRun,
    pub last_success_at: Option<Timestamp>,
}

/// Latest run per backup name plus its most recent success time.
#[derive(Debug, Clone, FromRow)]
pub struct LatestBackupRow {
    pub id: DbId,
    pub name: String,
    pub status: String,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub size_bytes: Option<i64>,
    pub message: Option<String>,
    pub last_success_at: Option<Timestamp>,
}

impl LatestBackupRow {
    /// Split into the latest run and the last success time.
    pub fn into_parts(self) -> (BackupRun, Option<Timestamp>) {
        let run = BackupRun {
            id: self.id,
            name: self.name,
            status: self.status,
            started_at: self.started_at,
            finished_at: self.finished_at,
            size_bytes: self.size_bytes,
            message: self.message,
        };
        (run, self.last_success_at)
    }
}
