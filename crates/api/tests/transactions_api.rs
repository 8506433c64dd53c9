//! HTTP-level tests for the ledger: transaction CRUD, filtered listing and
//! the report, summary and category endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

fn expense(date: &str, counterparty: &str, items: &[(&str, i64)]) -> Value {
    transaction("expense", date, counterparty, items)
}

fn transaction(direction: &str, date: &str, counterparty: &str, items: &[(&str, i64)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(category, amount)| json!({ "category": category, "amount_cents": amount }))
        .collect();
    json!({
        "direction": direction,
        "transaction_date": date,
        "counterparty": counterparty,
        "items": items,
    })
}

async fn create(app: &axum::Router, token: &str, body: Value) -> Value {
    let response = post_json_auth(app.clone(), "/api/v1/transactions", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn get_data(app: &axum::Router, token: &str, uri: &str) -> Value {
    let response = get_auth(app.clone(), uri, token).await;
    assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    body_json(response).await["data"].clone()
}

/// Two expenses and one income across two months.
async fn seed(app: &axum::Router, token: &str) {
    create(app, token, expense("2024-05-03", "Rewe", &[("groceries", 1500), ("household", 500)])).await;
    create(app, token, expense("2024-06-10", "Aldi", &[("groceries", 3000)])).await;
    create(app, token, transaction("income", "2024-05-31", "Employer", &[("salary", 300_000)])).await;
}

fn counterparties(page: &Value) -> Vec<&str> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["counterparty"].as_str().unwrap())
        .collect()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_returns_items_and_total(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);

    let created = create(
        &app,
        &token,
        expense("2024-05-03", "Rewe", &[("groceries", 1500), ("household", 500)]),
    )
    .await;

    assert_eq!(created["direction"], "expense");
    assert_eq!(created["total_cents"], 2000);
    assert_eq!(created["items"].as_array().unwrap().len(), 2);
    assert_eq!(created["items"][0]["category"], "groceries");

    let id = created["id"].as_i64().unwrap();
    let fetched = get_data(&app, &token, &format!("/api/v1/transactions/{id}")).await;
    assert_eq!(fetched["total_cents"], 2000);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_filters_sorts_and_pages(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);
    seed(&app, &token).await;

    let all = get_data(&app, &token, "/api/v1/transactions?sort_by=amount&sort_direction=asc").await;
    assert_eq!(counterparties(&all), vec!["Rewe", "Aldi", "Employer"]);
    assert_eq!(all["total"], 3);

    let expenses = get_data(&app, &token, "/api/v1/transactions?direction=expense").await;
    assert_eq!(expenses["total"], 2);

    let groceries = get_data(
        &app,
        &token,
        "/api/v1/transactions?category=groceries&date_from=2024-06-01&date_to=2024-06-30",
    )
    .await;
    assert_eq!(counterparties(&groceries), vec!["Aldi"]);

    let searched = get_data(&app, &token, "/api/v1/transactions?search_term=rew").await;
    assert_eq!(counterparties(&searched), vec!["Rewe"]);

    let paged = get_data(
        &app,
        &token,
        "/api/v1/transactions?sort_by=amount&sort_direction=desc&page=1&page_size=2",
    )
    .await;
    assert_eq!(counterparties(&paged), vec!["Employer", "Aldi"]);
    assert_eq!(paged["has_more"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn report_summary_and_categories(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);
    seed(&app, &token).await;

    let report = get_data(&app, &token, "/api/v1/transactions/report?group_by=category").await;
    let keys: Vec<&str> = report
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["groceries", "household", "salary"]);
    assert_eq!(report[0]["expense_cents"], 4500);
    assert_eq!(report[2]["income_cents"], 300_000);
    assert_eq!(report[2]["net_cents"], 300_000);

    let summary = get_data(&app, &token, "/api/v1/transactions/summary").await;
    assert_eq!(summary["income_cents"], 300_000);
    assert_eq!(summary["expense_cents"], 5000);
    assert_eq!(summary["net_cents"], 295_000);
    assert_eq!(summary["transaction_count"], 3);
    assert!(summary.get("key").is_none());

    let categories = get_data(&app, &token, "/api/v1/transactions/categories").await;
    assert_eq!(categories, json!(["groceries", "household", "salary"]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_replaces_items_and_delete_removes(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);

    let created = create(&app, &token, expense("2024-05-03", "Rewe", &[("groceries", 1500)])).await;
    let uri = format!("/api/v1/transactions/{}", created["id"]);

    let response = put_json_auth(
        app.clone(),
        &uri,
        expense("2024-05-04", "Rewe City", &[("drinks", 250), ("snacks", 300)]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["counterparty"], "Rewe City");
    assert_eq!(updated["total_cents"], 550);
    assert_eq!(updated["items"].as_array().unwrap().len(), 2);

    assert_eq!(delete_auth(app.clone(), &uri, &token).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(get_auth(app.clone(), &uri, &token).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(delete_auth(app, &uri, &token).await.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn transactions_are_private_to_their_owner(pool: PgPool) {
    let (_, alice) = common::create_user_with_token(&pool, "alice").await;
    let (_, bob) = common::create_user_with_token(&pool, "bob").await;
    let app = common::build_test_app(pool);

    let created = create(&app, &alice, expense("2024-05-03", "Rewe", &[("groceries", 1500)])).await;
    let uri = format!("/api/v1/transactions/{}", created["id"]);

    assert_eq!(get_auth(app.clone(), &uri, &bob).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(delete_auth(app.clone(), &uri, &bob).await.status(), StatusCode::NOT_FOUND);

    let listed = get_data(&app, &bob, "/api/v1/transactions").await;
    assert_eq!(listed["total"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_input_is_rejected(pool: PgPool) {
    let (_, token) = common::create_user_with_token(&pool, "alice").await;
    let app = common::build_test_app(pool);

    for body in [
        transaction("gift", "2024-05-03", "Rewe", &[("groceries", 100)]),
        expense("2024-05-03", "   ", &[("groceries", 100)]),
        expense("2024-05-03", "Rewe", &[]),
        expense("2024-05-03", "Rewe", &[("groceries", 0)]),
        expense("2024-05-03", "Rewe", &[("", 100)]),
    ] {
        let response = post_json_auth(app.clone(), "/api/v1/transactions", body.clone(), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    for query in [
        "?direction=gift",
        "?date_from=2024-06-01&date_to=2024-05-01",
        "?min_amount_cents=500&max_amount_cents=100",
        "?sort_by=mood",
    ] {
        let response = get_auth(app.clone(), &format!("/api/v1/transactions{query}"), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{query}");
    }

    let response = get_auth(app, "/api/v1/transactions/report?group_by=weekday", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
