//! Handlers for the ledger: transaction CRUD, the filtered listing and the
//! aggregate reports.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use homestead_core::error::CoreError;
use homestead_core::ledger::{validate_item, validate_transaction, TransactionDirection};
use homestead_core::pagination::Page;
use homestead_core::types::DbId;
use homestead_db::models::transaction::CreateTransaction;
use homestead_db::repositories::TransactionRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::TransactionListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Listing and aggregates
// ---------------------------------------------------------------------------

/// GET /api/v1/transactions
pub async fn list_transactions(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = params.to_filter()?;

    let items = TransactionRepo::list(&state.pool, auth.user_id, &filter).await?;
    let total = TransactionRepo::count(&state.pool, auth.user_id, &filter).await?;

    Ok(Json(DataResponse {
        data: Page::new(items, total, &filter.page),
    }))
}

/// GET /api/v1/transactions/report?group_by=category|month|counterparty
///
/// Income and expense totals per group over the filtered transactions.
pub async fn report(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = params.to_filter()?;
    let grouping = params.grouping()?;

    let rows = TransactionRepo::report(&state.pool, auth.user_id, &filter, grouping).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /api/v1/transactions/summary
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = params.to_filter()?;
    let totals = TransactionRepo::summary(&state.pool, auth.user_id, &filter).await?;
    Ok(Json(DataResponse { data: totals }))
}

/// GET /api/v1/transactions/categories
pub async fn categories(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let categories = TransactionRepo::categories(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: categories }))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/transactions/{id}
pub async fn get_transaction(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let transaction = TransactionRepo::find_by_id(&state.pool, auth.user_id, id)
        .await?
        .ok_or(AppError::not_found("Transaction", id))?;
    Ok(Json(DataResponse { data: transaction }))
}

/// POST /api/v1/transactions
pub async fn create_transaction(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTransaction>,
) -> AppResult<impl IntoResponse> {
    let direction = validate_input(&input)?;

    let transaction = TransactionRepo::create(&state.pool, auth.user_id, direction, &input).await?;
    tracing::info!(
        transaction_id = transaction.id,
        user_id = auth.user_id,
        total_cents = transaction.total_cents,
        "Transaction created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: transaction })))
}

/// PUT /api/v1/transactions/{id}
///
/// Replace a transaction, including all of its items.
pub async fn update_transaction(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateTransaction>,
) -> AppResult<impl IntoResponse> {
    let direction = validate_input(&input)?;

    let transaction = TransactionRepo::update(&state.pool, auth.user_id, id, direction, &input)
        .await?
        .ok_or(AppError::not_found("Transaction", id))?;

    tracing::info!(transaction_id = id, user_id = auth.user_id, "Transaction updated");
    Ok(Json(DataResponse { data: transaction }))
}

/// DELETE /api/v1/transactions/{id}
pub async fn delete_transaction(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !TransactionRepo::delete(&state.pool, auth.user_id, id).await? {
        return Err(AppError::not_found("Transaction", id));
    }
    tracing::info!(transaction_id = id, user_id = auth.user_id, "Transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_input(input: &CreateTransaction) -> Result<TransactionDirection, CoreError> {
    let direction = TransactionDirection::parse(&input.direction)?;
    validate_transaction(&input.counterparty, input.items.len())?;
    for item in &input.items {
        validate_item(&item.category, item.amount_cents)?;
    }
    Ok(direction)
}
