//! Per-user settings row.

use homestead_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSettings {
    pub user_id: DbId,
    pub default_page_size: i32,
    pub currency: String,
    pub default_title_sort: String,
    pub default_sort_direction: String,
    pub timezone: String,
    pub updated_at: Timestamp,
}
