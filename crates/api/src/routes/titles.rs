//! Route definitions for the `/titles` resource.

use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::handlers::titles;
use crate::state::AppState;

/// Routes mounted at `/titles`.
///
/// ```text
/// GET    /                         -> list_titles
/// POST   /                         -> upsert_title
/// GET    /{id}                     -> get_title
/// PUT    /{id}/watchlist           -> add_to_watchlist
/// DELETE /{id}/watchlist           -> remove_from_watchlist
/// PATCH  /{id}/details             -> update_details
/// POST   /{id}/watched             -> mark_movie_watched
/// GET    /{id}/media               -> list_media
/// POST   /{id}/media               -> add_media
/// DELETE /{id}/media/{media_id}    -> delete_media
/// GET    /{id}/images/{file}       -> get_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(titles::list_titles).post(titles::upsert_title))
        .route("/{id}", get(titles::get_title))
        .route(
            "/{id}/watchlist",
            put(titles::add_to_watchlist).delete(titles::remove_from_watchlist),
        )
        .route("/{id}/details", patch(titles::update_details))
        .route("/{id}/watched", post(titles::mark_movie_watched))
        .route("/{id}/media", get(titles::list_media).post(titles::add_media))
        .route("/{id}/media/{media_id}", delete(titles::delete_media))
        .route("/{id}/images/{file}", get(titles::get_image))
}
