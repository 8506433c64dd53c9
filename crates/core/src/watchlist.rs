//! Watchlist vocabulary: title types, watch statuses, sort keys and the
//! validation rules for per-user title data and collections.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of the free-text notes attached to a watchlist entry.
pub const MAX_NOTES_LENGTH: usize = 5_000;

/// Maximum length of a collection name.
pub const MAX_COLLECTION_NAME_LENGTH: usize = 100;

/// Highest watch count accepted for a single episode or movie.
pub const MAX_WATCH_COUNT: i32 = 1_000;

// ---------------------------------------------------------------------------
// Title type
// ---------------------------------------------------------------------------

/// The two kinds of catalog title. Determines which runtime and episode
/// logic applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleType {
    Movie,
    Tv,
}

impl TitleType {
    pub const ALL: &'static [&'static str] = &["movie", "tv"];

    /// Parse `movie` / `tv` case-insensitively.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let v = value.trim();
        if v.eq_ignore_ascii_case("movie") {
            Ok(Self::Movie)
        } else if v.eq_ignore_ascii_case("tv") {
            Ok(Self::Tv)
        } else {
            Err(CoreError::invalid_choice("title_type", v, Self::ALL))
        }
    }

    /// Value stored in `titles.type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

// ---------------------------------------------------------------------------
// Watch status
// ---------------------------------------------------------------------------

/// Aggregate per-user viewing progress of a title.
///
/// For movies the aggregate count is the title-level watch count. For tv it
/// is the minimum watch count across the title's episodes, so a show counts
/// as watched only once every episode has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    /// Aggregate count is 0.
    Unwatched,
    /// Tv only: aggregate count is 0 but some episode has been watched.
    PartiallyWatched,
    /// Aggregate count is at least 1.
    FullyWatched,
}

impl WatchStatus {
    pub const ALL: &'static [&'static str] = &["unwatched", "partially_watched", "fully_watched"];

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unwatched" => Ok(Self::Unwatched),
            "partially_watched" => Ok(Self::PartiallyWatched),
            "fully_watched" => Ok(Self::FullyWatched),
            _ => Err(CoreError::invalid_choice("watch_status", value.trim(), Self::ALL)),
        }
    }

    /// Classify a title from its aggregate and highest episode watch counts.
    pub fn classify(title_type: TitleType, watch_count: i32, max_episode_count: i32) -> Self {
        if watch_count >= 1 {
            Self::FullyWatched
        } else if title_type == TitleType::Tv && max_episode_count > 0 {
            Self::PartiallyWatched
        } else {
            Self::Unwatched
        }
    }
}

// ---------------------------------------------------------------------------
// Listing scope
// ---------------------------------------------------------------------------

/// Which side of the requesting user's watchlist a title listing covers.
///
/// Every title listing is scoped to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleScope {
    /// Titles the user has added.
    #[default]
    Watchlist,
    /// Catalog titles the user has not added.
    NotInWatchlist,
}

impl TitleScope {
    /// Map the `in_watchlist` query flag; absent means the user's watchlist.
    pub fn from_flag(in_watchlist: Option<bool>) -> Self {
        match in_watchlist {
            Some(false) => Self::NotInWatchlist,
            _ => Self::Watchlist,
        }
    }
}

// ---------------------------------------------------------------------------
// Sort keys
// ---------------------------------------------------------------------------

/// Whitelisted sort keys for title listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleSortKey {
    /// Most recent of the title-level and any episode-level update.
    #[default]
    LastUpdated,
    Rating,
    Popularity,
    ReleaseDate,
    TitleName,
    Duration,
    DataUpdated,
}

impl TitleSortKey {
    pub const ALL: &'static [&'static str] = &[
        "last_updated",
        "rating",
        "popularity",
        "release_date",
        "title_name",
        "duration",
        "data_updated",
    ];

    /// Parse a sort key. Absent or blank falls back to the default ordering.
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Self::default());
        };
        match v.to_ascii_lowercase().as_str() {
            "last_updated" => Ok(Self::LastUpdated),
            "rating" => Ok(Self::Rating),
            "popularity" => Ok(Self::Popularity),
            "release_date" => Ok(Self::ReleaseDate),
            "title_name" => Ok(Self::TitleName),
            "duration" => Ok(Self::Duration),
            "data_updated" => Ok(Self::DataUpdated),
            _ => Err(CoreError::invalid_choice("sort_by", v, Self::ALL)),
        }
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Request path under which a stored title image is served.
pub fn image_request_path(title_id: DbId, image_id: DbId, format: &str) -> String {
    format!("/api/v1/titles/{title_id}/images/{image_id}.{format}")
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate free-text notes length.
pub fn validate_notes(notes: &str) -> Result<(), CoreError> {
    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(CoreError::Validation(format!(
            "notes must be at most {MAX_NOTES_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a watch count written by a client.
pub fn validate_watch_count(count: i32) -> Result<(), CoreError> {
    if !(0..=MAX_WATCH_COUNT).contains(&count) {
        return Err(CoreError::Validation(format!(
            "watch_count must be between 0 and {MAX_WATCH_COUNT}, got {count}"
        )));
    }
    Ok(())
}

/// Validate a collection name: non-blank and within the length limit.
pub fn validate_collection_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("collection name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_COLLECTION_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "collection name must be at most {MAX_COLLECTION_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate that `parent` can hold a child collection.
///
/// Collections nest one level deep: the parent must itself be top-level and
/// must not be the collection being edited.
pub fn validate_collection_parent(
    collection_id: Option<DbId>,
    parent_id: DbId,
    parent_has_parent: bool,
) -> Result<(), CoreError> {
    if collection_id == Some(parent_id) {
        return Err(CoreError::Validation(
            "a collection cannot be its own parent".into(),
        ));
    }
    if parent_has_parent {
        return Err(CoreError::Validation(
            "collections can only be nested one level deep".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn title_type_is_case_insensitive() {
        assert_eq!(TitleType::parse("TV").unwrap(), TitleType::Tv);
        assert_eq!(TitleType::parse("Movie").unwrap(), TitleType::Movie);
    }

    #[test]
    fn unknown_title_type_fails_validation() {
        assert_matches!(TitleType::parse("anime"), Err(CoreError::Validation(msg)) if msg.contains("movie, tv"));
    }

    #[test]
    fn watch_status_parses_snake_case() {
        assert_eq!(
            WatchStatus::parse("partially_watched").unwrap(),
            WatchStatus::PartiallyWatched
        );
        assert_matches!(WatchStatus::parse("half"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn classify_movie_ignores_episode_counts() {
        assert_eq!(
            WatchStatus::classify(TitleType::Movie, 0, 3),
            WatchStatus::Unwatched
        );
        assert_eq!(
            WatchStatus::classify(TitleType::Movie, 2, 0),
            WatchStatus::FullyWatched
        );
    }

    #[test]
    fn classify_tv_partially_watched() {
        assert_eq!(
            WatchStatus::classify(TitleType::Tv, 0, 1),
            WatchStatus::PartiallyWatched
        );
        assert_eq!(WatchStatus::classify(TitleType::Tv, 0, 0), WatchStatus::Unwatched);
        assert_eq!(WatchStatus::classify(TitleType::Tv, 1, 4), WatchStatus::FullyWatched);
    }

    #[test]
    fn scope_defaults_to_watchlist() {
        assert_eq!(TitleScope::from_flag(None), TitleScope::Watchlist);
        assert_eq!(TitleScope::from_flag(Some(true)), TitleScope::Watchlist);
        assert_eq!(TitleScope::from_flag(Some(false)), TitleScope::NotInWatchlist);
    }

    #[test]
    fn sort_key_defaults_and_rejects_unknown() {
        assert_eq!(TitleSortKey::parse(None).unwrap(), TitleSortKey::LastUpdated);
        assert_eq!(TitleSortKey::parse(Some("Duration")).unwrap(), TitleSortKey::Duration);
        assert_matches!(
            TitleSortKey::parse(Some("name; DROP TABLE titles")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn image_path_includes_ids_and_format() {
        assert_eq!(image_request_path(7, 42, "webp"), "/api/v1/titles/7/images/42.webp");
    }

    #[test]
    fn nested_parent_is_rejected() {
        assert!(validate_collection_parent(Some(2), 1, false).is_ok());
        assert_matches!(validate_collection_parent(Some(2), 1, true), Err(CoreError::Validation(_)));
        assert_matches!(validate_collection_parent(Some(3), 3, false), Err(CoreError::Validation(_)));
    }

    #[test]
    fn watch_count_bounds() {
        assert!(validate_watch_count(0).is_ok());
        assert!(validate_watch_count(-1).is_err());
        assert!(validate_watch_count(MAX_WATCH_COUNT + 1).is_err());
    }

    #[test]
    fn collection_name_rules() {
        assert!(validate_collection_name("Comfort shows").is_ok());
        assert!(validate_collection_name("   ").is_err());
        assert!(validate_collection_name(&"x".repeat(MAX_COLLECTION_NAME_LENGTH + 1)).is_err());
    }
}
