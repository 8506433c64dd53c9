//! Route definitions for the `/collections` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::collections;
use crate::state::AppState;

/// Routes mounted at `/collections`.
///
/// ```text
/// GET    /                        -> list_collections
/// POST   /                        -> create_collection
/// GET    /{id}                    -> get_collection
/// PUT    /{id}                    -> update_collection
/// DELETE /{id}                    -> delete_collection
/// PUT    /{id}/titles/{title_id}  -> add_title
/// DELETE /{id}/titles/{title_id}  -> remove_title
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/{id}",
            get(collections::get_collection)
                .put(collections::update_collection)
                .delete(collections::delete_collection),
        )
        .route(
            "/{id}/titles/{title_id}",
            put(collections::add_title).delete(collections::remove_title),
        )
}
