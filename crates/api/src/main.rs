use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homestead_api::auth::bootstrap;
use homestead_api::config::ServerConfig;
use homestead_api::router::build_app_router;
use homestead_api::state::AppState;
use homestead_db::repositories::{SessionRepo, TelemetryRepo};
use homestead_db::DbPool;

const PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homestead_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = homestead_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    homestead_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    homestead_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- First-run account ---
    if let (Ok(username), Ok(password)) = (
        std::env::var("BOOTSTRAP_USERNAME"),
        std::env::var("BOOTSTRAP_PASSWORD"),
    ) {
        match bootstrap::ensure_user(&pool, &username, &password).await {
            Ok(Some(user)) => tracing::info!(user_id = user.id, username = %user.username, "Bootstrap user created"),
            Ok(None) => tracing::debug!(%username, "Bootstrap user already exists"),
            Err(e) => tracing::error!(error = %e, "Failed to create bootstrap user"),
        }
    }

    match SessionRepo::cleanup_expired(&pool).await {
        Ok(removed) => tracing::info!(removed, "Expired sessions cleaned up"),
        Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
    }

    // --- Resource log retention ---
    let prune_handle = spawn_resource_log_pruner(pool.clone(), config.resource_log_retention_days);

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(());
    });

    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let drain_deadline = async move {
        if signal_rx.await.is_ok() {
            tokio::time::sleep(drain_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server.into_future() => result.expect("Server error"),
        () = drain_deadline => {
            tracing::warn!(timeout_secs = config.shutdown_timeout_secs, "In-flight requests did not drain in time");
        }
    }

    // --- Post-shutdown cleanup ---
    prune_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Periodically delete resource samples older than the retention window.
fn spawn_resource_log_pruner(pool: DbPool, retention_days: i64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let cutoff = chrono::Utc::now() - chrono::Duration::days(retention_days);
            match TelemetryRepo::prune_resource_logs(&pool, cutoff).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Pruned old resource logs"),
                Err(e) => tracing::warn!(error = %e, "Resource log pruning failed"),
            }
        }
    })
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
