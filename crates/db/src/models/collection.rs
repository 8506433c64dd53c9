//! User-owned title collections.

use homestead_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `collections` table plus its title count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Collection {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub parent_collection_id: Option<DbId>,
    pub title_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a collection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollection {
    pub name: String,
    pub description: Option<String>,
    pub parent_collection_id: Option<DbId>,
}

/// DTO for updating a collection. All fields are optional; the parent can
/// only be set, moving a child under another top-level collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCollection {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_collection_id: Option<DbId>,
}
