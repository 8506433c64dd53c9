//! Route definitions for episode and season watch progress.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::episodes;
use crate::state::AppState;

/// Routes mounted at `/episodes`.
///
/// ```text
/// PUT /{id}/watch-count -> set_watch_count
/// ```
pub fn episode_router() -> Router<AppState> {
    Router::new().route("/{id}/watch-count", put(episodes::set_watch_count))
}

/// Routes mounted at `/seasons`.
///
/// ```text
/// POST /{id}/watched -> mark_season_watched
/// ```
pub fn season_router() -> Router<AppState> {
    Router::new().route("/{id}/watched", post(episodes::mark_season_watched))
}
