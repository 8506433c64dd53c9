//! HTTP-level tests for home-server telemetry.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, get_auth, post_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn get_data(app: &axum::Router, token: &str, uri: &str) -> Value {
    let response = get_auth(app.clone(), uri, token).await;
    assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    body_json(response).await["data"].clone()
}

fn backup(name: &str, status: &str, hours_ago: i64) -> Value {
    let finished = Utc::now() - Duration::hours(hours_ago);
    json!({
        "name": name,
        "status": status,
        "started_at": finished - Duration::minutes(10),
        "finished_at": finished,
        "size_bytes": 1_048_576,
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn disks_report_configured_mount_points(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);

    let disks = get_data(&app, &token, "/api/v1/telemetry/disks").await;
    let disks = disks.as_array().unwrap();
    assert_eq!(disks.len(), 1);
    assert_eq!(disks[0]["path"], "/");
    assert!(disks[0]["total_bytes"].is_u64());
    assert!(disks[0]["health"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn resource_logs_are_recorded_and_filtered(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);

    for (host, cpu) in [("nas", 12.5), ("nas", 40.0), ("pi", 3.0)] {
        let response = post_json_auth(
            app.clone(),
            "/api/v1/telemetry/resource-logs",
            json!({ "host": host, "cpu_percent": cpu, "memory_percent": 55.0, "load_average": 0.4 }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let nas = get_data(&app, &token, "/api/v1/telemetry/resource-logs?host=nas").await;
    assert_eq!(nas.as_array().unwrap().len(), 2);

    let limited = get_data(&app, &token, "/api/v1/telemetry/resource-logs?limit=1").await;
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let response = get_auth(app, "/api/v1/telemetry/resource-logs?limit=0", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn resource_log_validation(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);

    for body in [
        json!({ "host": "nas", "cpu_percent": 120.0, "memory_percent": 10.0 }),
        json!({ "host": "nas", "cpu_percent": 10.0, "memory_percent": -1.0 }),
        json!({ "host": " ", "cpu_percent": 10.0, "memory_percent": 10.0 }),
        json!({ "host": "nas", "cpu_percent": 10.0, "memory_percent": 10.0, "load_average": -2.0 }),
    ] {
        let response =
            post_json_auth(app.clone(), "/api/v1/telemetry/resource-logs", body.clone(), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn backup_status_classifies_latest_run_per_job(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);

    for body in [
        backup("photos", "success", 2),
        backup("documents", "success", 48),
        backup("media", "success", 30),
        backup("media", "failed", 1),
    ] {
        let response = post_json_auth(app.clone(), "/api/v1/telemetry/backups", body, &token).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let statuses = get_data(&app, &token, "/api/v1/telemetry/backups/status").await;
    let health = |name: &str| {
        statuses
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["name"] == name)
            .map(|s| s["health"].clone())
            .unwrap()
    };
    assert_eq!(health("photos"), "healthy");
    assert_eq!(health("documents"), "stale");
    assert_eq!(health("media"), "failing");

    let media = statuses
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "media")
        .unwrap();
    assert_eq!(media["latest"]["status"], "failed");
    assert!(media["last_success_at"].is_string());

    let runs = get_data(&app, &token, "/api/v1/telemetry/backups?name=media").await;
    assert_eq!(runs.as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn backup_validation(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);

    let mut reversed = backup("photos", "success", 1);
    reversed["started_at"] = json!(Utc::now());

    for body in [backup("photos", "partial", 1), backup("", "success", 1), reversed] {
        let response =
            post_json_auth(app.clone(), "/api/v1/telemetry/backups", body.clone(), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}
