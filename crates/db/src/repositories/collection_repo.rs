//! Repository for `collections` and `collection_titles`.
//!
//! Every statement is scoped by `user_id`; a collection owned by someone
//! else behaves exactly like one that does not exist.

use homestead_core::types::DbId;
use sqlx::PgPool;

use crate::models::collection::{Collection, CreateCollection, UpdateCollection};

const COLUMNS: &str = "c.id, c.user_id, c.name, c.description, c.parent_collection_id, \
    (SELECT COUNT(*) FROM collection_titles ct WHERE ct.collection_id = c.id) AS title_count, \
    c.created_at, c.updated_at";

pub struct CollectionRepo;

impl CollectionRepo {
    /// All of a user's collections, parents before their children.
    pub async fn list(pool: &PgPool, user_id: DbId) -> Result<Vec<Collection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM collections c WHERE c.user_id = $1 \
             ORDER BY COALESCE(c.parent_collection_id, c.id), c.parent_collection_id NULLS FIRST, c.name"
        );
        sqlx::query_as::<_, Collection>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Collection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM collections c WHERE c.id = $1 AND c.user_id = $2");
        sqlx::query_as::<_, Collection>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateCollection,
    ) -> Result<Collection, sqlx::Error> {
        let query = format!(
            "WITH c AS ( \
                INSERT INTO collections (user_id, name, description, parent_collection_id) \
                VALUES ($1, $2, $3, $4) RETURNING * \
             ) SELECT {COLUMNS} FROM c"
        );
        sqlx::query_as::<_, Collection>(&query)
            .bind(user_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(input.parent_collection_id)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateCollection,
    ) -> Result<Option<Collection>, sqlx::Error> {
        let query = format!(
            "WITH c AS ( \
                UPDATE collections SET \
                    name = COALESCE($3, name), \
                    description = COALESCE($4, description), \
                    parent_collection_id = COALESCE($5, parent_collection_id), \
                    updated_at = NOW() \
                WHERE id = $1 AND user_id = $2 RETURNING * \
             ) SELECT {COLUMNS} FROM c"
        );
        sqlx::query_as::<_, Collection>(&query)
            .bind(id)
            .bind(user_id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(input.parent_collection_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a collection; its children go with it.
    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn has_children(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM collections WHERE parent_collection_id = $1)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Link a title. Linking twice is a no-op; returns `true` if a row was added.
    pub async fn add_title(
        pool: &PgPool,
        collection_id: DbId,
        title_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO collection_titles (collection_id, title_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(collection_id)
        .bind(title_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_title(
        pool: &PgPool,
        collection_id: DbId,
        title_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM collection_titles WHERE collection_id = $1 AND title_id = $2")
                .bind(collection_id)
                .bind(title_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
