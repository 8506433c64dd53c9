//! Route definitions for `/telemetry`.

use axum::routing::get;
use axum::Router;

use crate::handlers::telemetry;
use crate::state::AppState;

/// Routes mounted at `/telemetry`.
///
/// ```text
/// GET  /disks            -> disks
/// GET  /resource-logs    -> list_resource_logs
/// POST /resource-logs    -> record_resource_log
/// GET  /backups          -> list_backups
/// POST /backups          -> record_backup
/// GET  /backups/status   -> backup_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/disks", get(telemetry::disks))
        .route(
            "/resource-logs",
            get(telemetry::list_resource_logs).post(telemetry::record_resource_log),
        )
        .route(
            "/backups",
            get(telemetry::list_backups).post(telemetry::record_backup),
        )
        .route("/backups/status", get(telemetry::backup_status))
}
