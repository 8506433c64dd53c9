//! Handlers for per-episode and per-season watch progress.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use homestead_core::types::DbId;
use homestead_core::watchlist::validate_watch_count;
use homestead_db::models::episode::SetWatchCount;
use homestead_db::repositories::EpisodeRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::titles::require_watchlisted;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SeasonWatched {
    pub season_id: DbId,
    pub episodes_updated: u64,
}

/// PUT /api/v1/episodes/{id}/watch-count
///
/// Set the caller's watch count for one episode. The episode's title must be
/// on the caller's watchlist.
pub async fn set_watch_count(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(episode_id): Path<DbId>,
    Json(input): Json<SetWatchCount>,
) -> AppResult<impl IntoResponse> {
    validate_watch_count(input.watch_count)?;

    let title_id = EpisodeRepo::title_of_episode(&state.pool, episode_id)
        .await?
        .ok_or(AppError::not_found("Episode", episode_id))?;
    require_watchlisted(&state.pool, auth.user_id, title_id).await?;

    let progress =
        EpisodeRepo::set_watch_count(&state.pool, auth.user_id, episode_id, input.watch_count)
            .await?;

    tracing::info!(
        episode_id,
        title_id,
        user_id = auth.user_id,
        watch_count = progress.watch_count,
        "Episode watch count set",
    );
    Ok(Json(DataResponse { data: progress }))
}

/// POST /api/v1/seasons/{id}/watched
///
/// Mark every episode of a season watched at least once.
pub async fn mark_season_watched(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(season_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let title_id = EpisodeRepo::title_of_season(&state.pool, season_id)
        .await?
        .ok_or(AppError::not_found("Season", season_id))?;
    require_watchlisted(&state.pool, auth.user_id, title_id).await?;

    let episodes_updated =
        EpisodeRepo::mark_season_watched(&state.pool, auth.user_id, season_id).await?;

    tracing::info!(season_id, title_id, user_id = auth.user_id, episodes_updated, "Season marked watched");
    Ok(Json(DataResponse {
        data: SeasonWatched {
            season_id,
            episodes_updated,
        },
    }))
}
