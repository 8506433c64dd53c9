//! Route definitions for the caller's own account at `/user`.

use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// GET   /me        -> me
/// GET   /settings  -> get_settings
/// PATCH /settings  -> update_settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(settings::me))
        .route(
            "/settings",
            get(settings::get_settings).patch(settings::update_settings),
        )
}
