//! Repository for `titles` and the per-user watchlist rows hanging off them.
//!
//! Listings go through [`crate::query::titles`]; everything else is a fixed
//! statement.

use homestead_core::types::DbId;
use homestead_core::watchlist::{TitleType, WatchStatus};
use sqlx::PgPool;

use crate::models::episode::nest_episodes;
use crate::models::title::{
    group_images, ImageDescriptor, Title, TitleDetail, TitleListItem, TitleRow, UpdateTitleDetails,
    UpsertTitle, UserTitleDetails,
};
use crate::query::titles::{build_count_query, build_list_query, TitleFilter};
use crate::repositories::EpisodeRepo;

const COLUMNS: &str = "id, tmdb_id, type AS title_type, name, original_name, overview, rating, \
                       vote_count, release_date, runtime, created_at, updated_at";

const DETAIL_COLUMNS: &str = "id, user_id, title_id, favourite, notes, watch_count, last_updated";

/// Stored image needed to serve an image request.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredImage {
    pub source_path: String,
    pub format: String,
}

/// Provides catalog upserts, filtered listings and watchlist membership.
pub struct TitleRepo;

impl TitleRepo {
    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// One page of titles matching `filter`, in the filter's order.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &TitleFilter,
    ) -> Result<Vec<TitleListItem>, sqlx::Error> {
        let query = build_list_query(user_id, filter);
        let rows = query.query_as::<TitleRow>().fetch_all(pool).await?;
        Ok(rows.into_iter().map(TitleListItem::from).collect())
    }

    /// Number of titles matching `filter`, ignoring pagination.
    pub async fn count(pool: &PgPool, user_id: DbId, filter: &TitleFilter) -> Result<i64, sqlx::Error> {
        build_count_query(user_id, filter)
            .query_count()
            .fetch_one(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Title>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM titles WHERE id = $1");
        sqlx::query_as::<_, Title>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or refresh a title by `(tmdb_id, type)` along with its genres,
    /// images, seasons and episodes, in one database transaction.
    ///
    /// Genres and images are replaced. Seasons and episodes are upserted by
    /// number so existing episode ids, and the progress attached to them,
    /// survive a refresh.
    pub async fn upsert(
        pool: &PgPool,
        title_type: TitleType,
        input: &UpsertTitle,
    ) -> Result<Title, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO titles (tmdb_id, type, name, original_name, overview, rating, \
                                 vote_count, release_date, runtime) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT ON CONSTRAINT uq_titles_tmdb_id_type DO UPDATE SET \
                name = EXCLUDED.name, original_name = EXCLUDED.original_name, \
                overview = EXCLUDED.overview, rating = EXCLUDED.rating, \
                vote_count = EXCLUDED.vote_count, release_date = EXCLUDED.release_date, \
                runtime = EXCLUDED.runtime, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        let title = sqlx::query_as::<_, Title>(&query)
            .bind(input.tmdb_id)
            .bind(title_type.as_str())
            .bind(&input.name)
            .bind(&input.original_name)
            .bind(&input.overview)
            .bind(input.rating)
            .bind(input.vote_count)
            .bind(input.release_date)
            .bind(input.runtime)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(title.id)
            .execute(&mut *tx)
            .await?;
        for genre in &input.genres {
            let genre_id: DbId = sqlx::query_scalar(
                "INSERT INTO genres (name) VALUES ($1) \
                 ON CONFLICT ON CONSTRAINT uq_genres_name DO UPDATE SET name = EXCLUDED.name \
                 RETURNING id",
            )
            .bind(genre.trim())
            .fetch_one(&mut *tx)
            .await?;
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(title.id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM title_images WHERE title_id = $1")
            .bind(title.id)
            .execute(&mut *tx)
            .await?;
        for image in &input.images {
            sqlx::query(
                "INSERT INTO title_images (title_id, type, format, width, height, source_path) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(title.id)
            .bind(&image.image_type)
            .bind(&image.format)
            .bind(image.width)
            .bind(image.height)
            .bind(&image.source_path)
            .execute(&mut *tx)
            .await?;
        }

        for season in &input.seasons {
            let season_id: DbId = sqlx::query_scalar(
                "INSERT INTO seasons (title_id, season_number, name) VALUES ($1, $2, $3) \
                 ON CONFLICT ON CONSTRAINT uq_seasons_title_number DO UPDATE SET \
                    name = EXCLUDED.name, updated_at = NOW() \
                 RETURNING id",
            )
            .bind(title.id)
            .bind(season.season_number)
            .bind(&season.name)
            .fetch_one(&mut *tx)
            .await?;

            for episode in &season.episodes {
                sqlx::query(
                    "INSERT INTO episodes (title_id, season_id, episode_number, name, air_date, runtime) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT ON CONSTRAINT uq_episodes_season_number DO UPDATE SET \
                        name = EXCLUDED.name, air_date = EXCLUDED.air_date, \
                        runtime = EXCLUDED.runtime, updated_at = NOW()",
                )
                .bind(title.id)
                .bind(season_id)
                .bind(episode.episode_number)
                .bind(&episode.name)
                .bind(episode.air_date)
                .bind(episode.runtime)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(title)
    }

    pub async fn genres(pool: &PgPool, title_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT g.name FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
             WHERE tg.title_id = $1 ORDER BY g.name",
        )
        .bind(title_id)
        .fetch_all(pool)
        .await
    }

    pub async fn images(pool: &PgPool, title_id: DbId) -> Result<Vec<ImageDescriptor>, sqlx::Error> {
        sqlx::query_as::<_, ImageDescriptor>(
            "SELECT id, type AS image_type, format, width, height \
             FROM title_images WHERE title_id = $1 ORDER BY id",
        )
        .bind(title_id)
        .fetch_all(pool)
        .await
    }

    /// Look up an image by id, scoped to its title.
    pub async fn find_image(
        pool: &PgPool,
        title_id: DbId,
        image_id: DbId,
    ) -> Result<Option<StoredImage>, sqlx::Error> {
        sqlx::query_as::<_, StoredImage>(
            "SELECT source_path, format FROM title_images WHERE id = $1 AND title_id = $2",
        )
        .bind(image_id)
        .bind(title_id)
        .fetch_optional(pool)
        .await
    }

    /// Full title view for one user: catalog data, seasons with episode
    /// progress and the user's watchlist row.
    pub async fn detail(
        pool: &PgPool,
        user_id: DbId,
        title_id: DbId,
    ) -> Result<Option<TitleDetail>, sqlx::Error> {
        let Some(title) = Self::find_by_id(pool, title_id).await? else {
            return Ok(None);
        };

        let genres = Self::genres(pool, title_id).await?;
        let images = group_images(title_id, Self::images(pool, title_id).await?);
        let details = Self::user_details(pool, user_id, title_id).await?;
        let seasons = EpisodeRepo::seasons_for_title(pool, title_id).await?;
        let episodes = EpisodeRepo::progress_for_title(pool, user_id, title_id).await?;

        let kind = title.kind();
        let (watch_count, duration) = match kind {
            TitleType::Movie => (details.as_ref().map_or(0, |d| d.watch_count), title.runtime),
            TitleType::Tv => {
                let min = episodes.iter().map(|e| e.watch_count).min().unwrap_or(0);
                let runtimes: Vec<i32> = episodes.iter().filter_map(|e| e.runtime).collect();
                let duration = (!runtimes.is_empty()).then(|| runtimes.iter().sum());
                (min, duration)
            }
        };
        let max_episode = episodes.iter().map(|e| e.watch_count).max().unwrap_or(0);

        Ok(Some(TitleDetail {
            watch_status: WatchStatus::classify(kind, watch_count, max_episode),
            duration,
            title,
            genres,
            images,
            details,
            seasons: nest_episodes(seasons, episodes),
        }))
    }

    // -----------------------------------------------------------------------
    // Watchlist
    // -----------------------------------------------------------------------

    pub async fn user_details(
        pool: &PgPool,
        user_id: DbId,
        title_id: DbId,
    ) -> Result<Option<UserTitleDetails>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM user_title_details WHERE user_id = $1 AND title_id = $2"
        );
        sqlx::query_as::<_, UserTitleDetails>(&query)
            .bind(user_id)
            .bind(title_id)
            .fetch_optional(pool)
            .await
    }

    /// Add a title to the user's watchlist. Adding twice returns the existing row.
    pub async fn add_to_watchlist(
        pool: &PgPool,
        user_id: DbId,
        title_id: DbId,
    ) -> Result<UserTitleDetails, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_title_details (user_id, title_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_user_title_details_user_title \
             DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {DETAIL_COLUMNS}"
        );
        sqlx::query_as::<_, UserTitleDetails>(&query)
            .bind(user_id)
            .bind(title_id)
            .fetch_one(pool)
            .await
    }

    /// Remove a title from the watchlist together with the user's episode
    /// progress on it. Returns `true` if the title was on the watchlist.
    pub async fn remove_from_watchlist(
        pool: &PgPool,
        user_id: DbId,
        title_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result =
            sqlx::query("DELETE FROM user_title_details WHERE user_id = $1 AND title_id = $2")
                .bind(user_id)
                .bind(title_id)
                .execute(&mut *tx)
                .await?;

        sqlx::query(
            "DELETE FROM user_episode_details ued USING episodes e \
             WHERE ued.episode_id = e.id AND ued.user_id = $1 AND e.title_id = $2",
        )
        .bind(user_id)
        .bind(title_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Patch favourite and notes. Returns `None` if the title is not on the
    /// user's watchlist.
    pub async fn update_details(
        pool: &PgPool,
        user_id: DbId,
        title_id: DbId,
        input: &UpdateTitleDetails,
    ) -> Result<Option<UserTitleDetails>, sqlx::Error> {
        let query = format!(
            "UPDATE user_title_details SET \
                favourite = COALESCE($3, favourite), \
                notes = COALESCE($4, notes), \
                last_updated = NOW(), updated_at = NOW() \
             WHERE user_id = $1 AND title_id = $2 \
             RETURNING {DETAIL_COLUMNS}"
        );
        sqlx::query_as::<_, UserTitleDetails>(&query)
            .bind(user_id)
            .bind(title_id)
            .bind(input.favourite)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Record one more viewing of a movie on the watchlist.
    pub async fn increment_watch_count(
        pool: &PgPool,
        user_id: DbId,
        title_id: DbId,
    ) -> Result<Option<UserTitleDetails>, sqlx::Error> {
        let query = format!(
            "UPDATE user_title_details SET \
                watch_count = watch_count + 1, last_updated = NOW(), updated_at = NOW() \
             WHERE user_id = $1 AND title_id = $2 \
             RETURNING {DETAIL_COLUMNS}"
        );
        sqlx::query_as::<_, UserTitleDetails>(&query)
            .bind(user_id)
            .bind(title_id)
            .fetch_optional(pool)
            .await
    }
}
