//! Media file entries linked to titles.

use homestead_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `media_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MediaEntry {
    pub id: DbId,
    pub title_id: DbId,
    pub file_path: String,
    pub size_bytes: Option<i64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a media file against a title.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMediaEntry {
    pub file_path: String,
    pub size_bytes: Option<i64>,
}
