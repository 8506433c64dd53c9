//! Repository for `seasons`, `episodes` and per-user episode progress.

use homestead_core::types::DbId;
use sqlx::PgPool;

use crate::models::episode::{EpisodeProgress, Season, UserEpisodeDetails};

const PROGRESS_COLUMNS: &str = "id, user_id, episode_id, watch_count, last_updated";

pub struct EpisodeRepo;

impl EpisodeRepo {
    pub async fn seasons_for_title(pool: &PgPool, title_id: DbId) -> Result<Vec<Season>, sqlx::Error> {
        sqlx::query_as::<_, Season>(
            "SELECT id, title_id, season_number, name FROM seasons \
             WHERE title_id = $1 ORDER BY season_number",
        )
        .bind(title_id)
        .fetch_all(pool)
        .await
    }

    /// Episodes of a title with the user's watch count (0 when never watched).
    pub async fn progress_for_title(
        pool: &PgPool,
        user_id: DbId,
        title_id: DbId,
    ) -> Result<Vec<EpisodeProgress>, sqlx::Error> {
        sqlx::query_as::<_, EpisodeProgress>(
            "SELECT e.id, e.season_id, e.episode_number, e.name, e.air_date, e.runtime, \
                    COALESCE(ued.watch_count, 0) AS watch_count, ued.last_updated \
             FROM episodes e \
             LEFT JOIN user_episode_details ued ON ued.episode_id = e.id AND ued.user_id = $1 \
             WHERE e.title_id = $2 \
             ORDER BY e.episode_number, e.id",
        )
        .bind(user_id)
        .bind(title_id)
        .fetch_all(pool)
        .await
    }

    /// Title an episode belongs to.
    pub async fn title_of_episode(pool: &PgPool, episode_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT title_id FROM episodes WHERE id = $1")
            .bind(episode_id)
            .fetch_optional(pool)
            .await
    }

    /// Title a season belongs to.
    pub async fn title_of_season(pool: &PgPool, season_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT title_id FROM seasons WHERE id = $1")
            .bind(season_id)
            .fetch_optional(pool)
            .await
    }

    /// Set the user's watch count for one episode.
    pub async fn set_watch_count(
        pool: &PgPool,
        user_id: DbId,
        episode_id: DbId,
        watch_count: i32,
    ) -> Result<UserEpisodeDetails, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_episode_details (user_id, episode_id, watch_count) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_user_episode_details_user_episode DO UPDATE SET \
                watch_count = EXCLUDED.watch_count, last_updated = NOW(), updated_at = NOW() \
             RETURNING {PROGRESS_COLUMNS}"
        );
        sqlx::query_as::<_, UserEpisodeDetails>(&query)
            .bind(user_id)
            .bind(episode_id)
            .bind(watch_count)
            .fetch_one(pool)
            .await
    }

    /// Mark every episode of a season as watched at least once.
    /// Episodes already watched keep their count. Returns the number touched.
    pub async fn mark_season_watched(
        pool: &PgPool,
        user_id: DbId,
        season_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO user_episode_details (user_id, episode_id, watch_count) \
             SELECT $1, e.id, 1 FROM episodes e WHERE e.season_id = $2 \
             ON CONFLICT ON CONSTRAINT uq_user_episode_details_user_episode DO UPDATE SET \
                watch_count = GREATEST(user_episode_details.watch_count, 1), \
                last_updated = NOW(), updated_at = NOW()",
        )
        .bind(user_id)
        .bind(season_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
