//! Home-server telemetry evaluation.
//!
//! Pure logic. Disk statistics come from the HTTP layer (`statvfs`), resource
//! samples and backup runs from the database; this module only classifies
//! them.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Disk usage fraction at which a mount is reported as `warning`.
pub const DISK_WARNING_THRESHOLD: f64 = 0.80;

/// Disk usage fraction at which a mount is reported as `critical`.
pub const DISK_CRITICAL_THRESHOLD: f64 = 0.95;

/// Default maximum age of the latest successful backup before it is stale.
pub const DEFAULT_BACKUP_MAX_AGE_HOURS: i64 = 26;

// ---------------------------------------------------------------------------
// Disk usage
// ---------------------------------------------------------------------------

/// Health level of a mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskHealth {
    Ok,
    Warning,
    Critical,
    /// Statistics could not be read.
    Unknown,
}

/// Usage of one mounted filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct DiskUsage {
    pub path: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_pct: f64,
    pub health: DiskHealth,
}

impl DiskUsage {
    /// Build usage from raw block counts (`f_blocks`, `f_bavail`, `f_frsize`).
    pub fn from_blocks(path: &str, total_blocks: u64, available_blocks: u64, block_size: u64) -> Self {
        let total = total_blocks.saturating_mul(block_size);
        let free = available_blocks.saturating_mul(block_size);
        let used = total.saturating_sub(free);
        let usage_pct = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64
        };

        Self {
            path: path.to_string(),
            total_bytes: total,
            used_bytes: used,
            free_bytes: free,
            usage_pct,
            health: classify_disk_usage(usage_pct),
        }
    }

    /// Placeholder for a mount whose statistics could not be read.
    pub fn unavailable(path: &str) -> Self {
        Self {
            path: path.to_string(),
            total_bytes: 0,
            used_bytes: 0,
            free_bytes: 0,
            usage_pct: 0.0,
            health: DiskHealth::Unknown,
        }
    }
}

/// Classify a usage fraction (0.0 - 1.0) against the disk thresholds.
pub fn classify_disk_usage(usage_pct: f64) -> DiskHealth {
    if usage_pct >= DISK_CRITICAL_THRESHOLD {
        DiskHealth::Critical
    } else if usage_pct >= DISK_WARNING_THRESHOLD {
        DiskHealth::Warning
    } else {
        DiskHealth::Ok
    }
}

// ---------------------------------------------------------------------------
// Resource samples
// ---------------------------------------------------------------------------

/// Validate a percentage reported by the resource collector.
pub fn validate_percent(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{field} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

/// Outcome of a single backup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupOutcome {
    Success,
    Failed,
}

impl BackupOutcome {
    pub const ALL: &'static [&'static str] = &["success", "failed"];

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::invalid_choice("status", other, Self::ALL)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Overall state of a named backup job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupHealth {
    /// Latest run succeeded within the allowed age.
    Healthy,
    /// Latest run succeeded but is older than the allowed age.
    Stale,
    /// Latest run failed.
    Failing,
}

/// Classify a backup job from its most recent run.
pub fn evaluate_backup(
    latest_outcome: BackupOutcome,
    latest_finished_at: Timestamp,
    now: Timestamp,
    max_age: Duration,
) -> BackupHealth {
    match latest_outcome {
        BackupOutcome::Failed => BackupHealth::Failing,
        BackupOutcome::Success if now - latest_finished_at > max_age => BackupHealth::Stale,
        BackupOutcome::Success => BackupHealth::Healthy,
    }
}
