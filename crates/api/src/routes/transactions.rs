//! Route definitions for the `/transactions` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::transactions;
use crate::state::AppState;

/// Routes mounted at `/transactions`.
///
/// ```text
/// GET    /            -> list_transactions
/// POST   /            -> create_transaction
/// GET    /report      -> report
/// GET    /summary     -> summary
/// GET    /categories  -> categories
/// GET    /{id}        -> get_transaction
/// PUT    /{id}        -> update_transaction
/// DELETE /{id}        -> delete_transaction
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/report", get(transactions::report))
        .route("/summary", get(transactions::summary))
        .route("/categories", get(transactions::categories))
        .route(
            "/{id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
}
