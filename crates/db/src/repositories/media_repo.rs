//! Repository for the `media_entries` table.

use homestead_core::types::DbId;
use sqlx::PgPool;

use crate::models::media::{CreateMediaEntry, MediaEntry};

const COLUMNS: &str = "id, title_id, file_path, size_bytes, created_at, updated_at";

pub struct MediaRepo;

impl MediaRepo {
    pub async fn create(
        pool: &PgPool,
        title_id: DbId,
        input: &CreateMediaEntry,
    ) -> Result<MediaEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_entries (title_id, file_path, size_bytes) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaEntry>(&query)
            .bind(title_id)
            .bind(input.file_path.trim())
            .bind(input.size_bytes)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_title(pool: &PgPool, title_id: DbId) -> Result<Vec<MediaEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_entries WHERE title_id = $1 ORDER BY file_path");
        sqlx::query_as::<_, MediaEntry>(&query)
            .bind(title_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, title_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM media_entries WHERE id = $1 AND title_id = $2")
            .bind(id)
            .bind(title_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
