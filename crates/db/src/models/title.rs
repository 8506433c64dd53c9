//! Title catalog models, listing rows and the row-to-response mapping.

use std::collections::BTreeMap;

use homestead_core::text::split_delimited;
use homestead_core::types::{Date, DbId, Timestamp};
use homestead_core::watchlist::{image_request_path, TitleType, WatchStatus};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::episode::SeasonDetail;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `titles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Title {
    pub id: DbId,
    pub tmdb_id: i64,
    #[serde(rename = "type")]
    pub title_type: String,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub vote_count: Option<i32>,
    pub release_date: Option<Date>,
    pub runtime: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Title {
    pub fn kind(&self) -> TitleType {
        title_type_of(&self.title_type)
    }
}

/// A row from the `user_title_details` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserTitleDetails {
    pub id: DbId,
    pub user_id: DbId,
    pub title_id: DbId,
    pub favourite: bool,
    pub notes: Option<String>,
    pub watch_count: i32,
    pub last_updated: Timestamp,
}

/// Image descriptor as aggregated into the listing row's JSON array.
#[derive(Debug, Clone, FromRow, Deserialize)]
pub struct ImageDescriptor {
    pub id: DbId,
    #[serde(rename = "type")]
    pub image_type: String,
    pub format: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// One row of the title listing query.
#[derive(Debug, Clone, FromRow)]
pub struct TitleRow {
    pub id: DbId,
    pub tmdb_id: i64,
    pub title_type: String,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub vote_count: Option<i32>,
    pub release_date: Option<Date>,
    pub runtime: Option<i32>,
    pub updated_at: Timestamp,
    pub duration: Option<i32>,
    pub in_watchlist: bool,
    pub favourite: bool,
    pub notes: Option<String>,
    pub watch_count: i32,
    pub max_watch_count: i32,
    pub last_updated: Option<Timestamp>,
    /// `", "`-delimited genre names.
    pub genres: Option<String>,
    /// `", "`-delimited names of the requesting user's collections.
    pub collections: Option<String>,
    pub images: Option<Json<Vec<ImageDescriptor>>>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// An image as returned to clients, with the path it is served from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleImage {
    pub id: DbId,
    pub format: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub url: String,
}

/// Images keyed by image type (`poster`, `backdrop`, ...).
pub type ImageGroups = BTreeMap<String, Vec<TitleImage>>;

/// A title in a filtered listing.
#[derive(Debug, Clone, Serialize)]
pub struct TitleListItem {
    pub id: DbId,
    pub tmdb_id: i64,
    #[serde(rename = "type")]
    pub title_type: TitleType,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub vote_count: Option<i32>,
    pub release_date: Option<Date>,
    pub duration: Option<i32>,
    pub in_watchlist: bool,
    pub favourite: bool,
    pub notes: Option<String>,
    pub watch_count: i32,
    pub watch_status: WatchStatus,
    pub last_updated: Option<Timestamp>,
    pub data_updated: Timestamp,
    pub genres: Vec<String>,
    pub collections: Vec<String>,
    pub images: ImageGroups,
}

/// A title with its seasons, episodes and the user's progress.
#[derive(Debug, Clone, Serialize)]
pub struct TitleDetail {
    #[serde(flatten)]
    pub title: Title,
    pub genres: Vec<String>,
    pub images: ImageGroups,
    pub details: Option<UserTitleDetails>,
    pub watch_status: WatchStatus,
    pub duration: Option<i32>,
    pub seasons: Vec<SeasonDetail>,
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a stored `titles.type` value; the column is constrained to two values.
pub fn title_type_of(value: &str) -> TitleType {
    if value == TitleType::Tv.as_str() {
        TitleType::Tv
    } else {
        TitleType::Movie
    }
}

/// Group image descriptors by type, attaching each image's request path.
///
/// Order within a group follows the input order.
pub fn group_images(title_id: DbId, images: Vec<ImageDescriptor>) -> ImageGroups {
    let mut groups = ImageGroups::new();
    for image in images {
        let url = image_request_path(title_id, image.id, &image.format);
        groups.entry(image.image_type).or_default().push(TitleImage {
            id: image.id,
            format: image.format,
            width: image.width,
            height: image.height,
            url,
        });
    }
    groups
}

impl From<TitleRow> for TitleListItem {
    fn from(row: TitleRow) -> Self {
        let title_type = title_type_of(&row.title_type);
        let images = row.images.map(|Json(images)| images).unwrap_or_default();

        Self {
            id: row.id,
            tmdb_id: row.tmdb_id,
            title_type,
            watch_status: WatchStatus::classify(title_type, row.watch_count, row.max_watch_count),
            name: row.name,
            original_name: row.original_name,
            overview: row.overview,
            rating: row.rating,
            vote_count: row.vote_count,
            release_date: row.release_date,
            duration: row.duration,
            in_watchlist: row.in_watchlist,
            favourite: row.favourite,
            notes: row.notes,
            watch_count: row.watch_count,
            last_updated: row.last_updated,
            data_updated: row.updated_at,
            genres: split_delimited(row.genres.as_deref()),
            collections: split_delimited(row.collections.as_deref()),
            images: group_images(row.id, images),
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// Catalog metadata pushed by the scraper. Upserted by `(tmdb_id, type)`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertTitle {
    pub tmdb_id: i64,
    #[serde(rename = "type")]
    pub title_type: String,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub vote_count: Option<i32>,
    pub release_date: Option<Date>,
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<UpsertImage>,
    #[serde(default)]
    pub seasons: Vec<UpsertSeason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertImage {
    #[serde(rename = "type")]
    pub image_type: String,
    pub format: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub source_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSeason {
    pub season_number: i32,
    pub name: Option<String>,
    #[serde(default)]
    pub episodes: Vec<UpsertEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertEpisode {
    pub episode_number: i32,
    pub name: Option<String>,
    pub air_date: Option<Date>,
    pub runtime: Option<i32>,
}

/// DTO for patching the user's favourite flag and notes on a title.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTitleDetails {
    pub favourite: Option<bool>,
    pub notes: Option<String>,
}
