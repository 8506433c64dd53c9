pub mod auth;
pub mod collections;
pub mod episodes;
pub mod health;
pub mod telemetry;
pub mod titles;
pub mod transactions;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                              login (public)
/// /auth/refresh                            refresh (public)
/// /auth/logout                             logout (requires auth)
///
/// /titles                                  list, upsert
/// /titles/{id}                             detail
/// /titles/{id}/watchlist                   add, remove
/// /titles/{id}/details                     favourite / notes (PATCH)
/// /titles/{id}/watched                     movie watched (POST)
/// /titles/{id}/media                       list, create
/// /titles/{id}/media/{media_id}            delete
/// /titles/{id}/images/{image_id}.{format}  image bytes
///
/// /episodes/{id}/watch-count               set watch count (PUT)
/// /seasons/{id}/watched                    mark season watched (POST)
///
/// /collections                             list, create
/// /collections/{id}                        get, update, delete
/// /collections/{id}/titles/{title_id}      link, unlink
///
/// /transactions                            list, create
/// /transactions/{id}                       get, update, delete
/// /transactions/report                     grouped totals
/// /transactions/summary                    income / expense / net
/// /transactions/categories                 distinct categories
///
/// /telemetry/disks                         mount point usage
/// /telemetry/resource-logs                 list, record
/// /telemetry/backups                       list, record
/// /telemetry/backups/status                latest run per job
///
/// /user/me                                 current account
/// /user/settings                           get, update (PATCH)
/// ```
///
/// Everything except `/auth/login` and `/auth/refresh` requires a bearer
/// token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        // Watchlist.
        .nest("/titles", titles::router())
        .nest("/episodes", episodes::episode_router())
        .nest("/seasons", episodes::season_router())
        .nest("/collections", collections::router())
        // Ledger.
        .nest("/transactions", transactions::router())
        // Home-server telemetry.
        .nest("/telemetry", telemetry::router())
        .nest("/user", user::router())
}
