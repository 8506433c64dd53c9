//! Repository for the `user_settings` table.
//!
//! Column names in `UPDATE` statements come only from
//! [`SettingField::column`](homestead_core::settings::SettingField::column);
//! values are always bound.

use homestead_core::settings::{SettingUpdate, SettingValue};
use homestead_core::types::DbId;
use sqlx::PgPool;

use crate::models::settings::UserSettings;

const COLUMNS: &str = "user_id, default_page_size, currency, default_title_sort, \
                       default_sort_direction, timezone, updated_at";

pub struct SettingsRepo;

impl SettingsRepo {
    /// Fetch a user's settings, creating the default row on first access.
    pub async fn get_or_create(pool: &PgPool, user_id: DbId) -> Result<UserSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_settings (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSettings>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Apply validated updates and return the resulting row.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        updates: &[SettingUpdate],
    ) -> Result<UserSettings, sqlx::Error> {
        // Make sure the row exists so the UPDATE always hits.
        Self::get_or_create(pool, user_id).await?;

        let sql = build_update_sql(updates);
        let mut query = sqlx::query_as::<_, UserSettings>(&sql).bind(user_id);
        for update in updates {
            query = match &update.value {
                SettingValue::Int(v) => query.bind(*v),
                SettingValue::Text(v) => query.bind(v.as_str()),
            };
        }
        query.fetch_one(pool).await
    }
}

/// `UPDATE` with `$1` as the user id and one placeholder per assignment.
fn build_update_sql(updates: &[SettingUpdate]) -> String {
    let assignments: Vec<String> = updates
        .iter()
        .enumerate()
        .map(|(i, u)| format!("{} = ${}", u.field.column(), i + 2))
        .collect();
    format!(
        "UPDATE user_settings SET {}, updated_at = NOW() WHERE user_id = $1 RETURNING {COLUMNS}",
        assignments.join(", ")
    )
}
