//! Handlers for `/titles`: the filtered listing, catalog upserts, the
//! per-user watchlist, media entries and stored images.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use homestead_core::error::CoreError;
use homestead_core::pagination::Page;
use homestead_core::types::DbId;
use homestead_core::watchlist::{validate_notes, TitleType};
use homestead_db::models::media::CreateMediaEntry;
use homestead_db::models::title::{UpdateTitleDetails, UpsertTitle, UserTitleDetails};
use homestead_db::repositories::{MediaRepo, TitleRepo};
use homestead_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::TitleListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Listing and catalog
// ---------------------------------------------------------------------------

/// GET /api/v1/titles
///
/// Filtered, sorted and paginated titles, scoped to the caller's watchlist
/// (or to titles not on it with `in_watchlist=false`).
pub async fn list_titles(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TitleListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = params.into_filter()?;

    let items = TitleRepo::list(&state.pool, auth.user_id, &filter).await?;
    let total = TitleRepo::count(&state.pool, auth.user_id, &filter).await?;

    Ok(Json(DataResponse {
        data: Page::new(items, total, &filter.page),
    }))
}

/// POST /api/v1/titles
///
/// Insert or refresh catalog metadata for one title, including its genres,
/// images, seasons and episodes.
pub async fn upsert_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpsertTitle>,
) -> AppResult<impl IntoResponse> {
    let title_type = TitleType::parse(&input.title_type)?;
    validate_upsert(&input)?;

    let title = TitleRepo::upsert(&state.pool, title_type, &input).await?;

    tracing::info!(
        title_id = title.id,
        tmdb_id = title.tmdb_id,
        user_id = auth.user_id,
        "Title upserted",
    );

    Ok(Json(DataResponse { data: title }))
}

/// GET /api/v1/titles/{id}
pub async fn get_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = TitleRepo::detail(&state.pool, auth.user_id, title_id)
        .await?
        .ok_or(AppError::not_found("Title", title_id))?;

    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// Watchlist
// ---------------------------------------------------------------------------

/// PUT /api/v1/titles/{id}/watchlist
///
/// Add a title to the caller's watchlist. Adding twice is a no-op.
pub async fn add_to_watchlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_title_exists(&state.pool, title_id).await?;

    let details = TitleRepo::add_to_watchlist(&state.pool, auth.user_id, title_id).await?;
    tracing::info!(title_id, user_id = auth.user_id, "Title added to watchlist");

    Ok(Json(DataResponse { data: details }))
}

/// DELETE /api/v1/titles/{id}/watchlist
///
/// Remove a title and the caller's episode progress on it.
pub async fn remove_from_watchlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let removed = TitleRepo::remove_from_watchlist(&state.pool, auth.user_id, title_id).await?;
    if !removed {
        return Err(AppError::not_found("Watchlist entry", title_id));
    }

    tracing::info!(title_id, user_id = auth.user_id, "Title removed from watchlist");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/titles/{id}/details
pub async fn update_details(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
    Json(input): Json<UpdateTitleDetails>,
) -> AppResult<impl IntoResponse> {
    if let Some(notes) = input.notes.as_deref() {
        validate_notes(notes)?;
    }
    require_watchlisted(&state.pool, auth.user_id, title_id).await?;

    let details = TitleRepo::update_details(&state.pool, auth.user_id, title_id, &input)
        .await?
        .ok_or(AppError::not_found("Watchlist entry", title_id))?;

    Ok(Json(DataResponse { data: details }))
}

/// POST /api/v1/titles/{id}/watched
///
/// Record one more viewing of a movie. Tv progress is tracked per episode.
pub async fn mark_movie_watched(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let title = TitleRepo::find_by_id(&state.pool, title_id)
        .await?
        .ok_or(AppError::not_found("Title", title_id))?;
    if title.kind() != TitleType::Movie {
        return Err(CoreError::Validation(
            "tv progress is recorded per episode or season".into(),
        )
        .into());
    }
    require_watchlisted(&state.pool, auth.user_id, title_id).await?;

    let details = TitleRepo::increment_watch_count(&state.pool, auth.user_id, title_id)
        .await?
        .ok_or(AppError::not_found("Watchlist entry", title_id))?;

    tracing::info!(
        title_id,
        user_id = auth.user_id,
        watch_count = details.watch_count,
        "Movie marked watched",
    );
    Ok(Json(DataResponse { data: details }))
}

// ---------------------------------------------------------------------------
// Media entries
// ---------------------------------------------------------------------------

/// GET /api/v1/titles/{id}/media
pub async fn list_media(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_title_exists(&state.pool, title_id).await?;
    let entries = MediaRepo::list_for_title(&state.pool, title_id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/titles/{id}/media
pub async fn add_media(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
    Json(input): Json<CreateMediaEntry>,
) -> AppResult<impl IntoResponse> {
    if input.file_path.trim().is_empty() {
        return Err(CoreError::Validation("file_path must not be empty".into()).into());
    }
    if input.size_bytes.is_some_and(|s| s < 0) {
        return Err(CoreError::Validation("size_bytes must not be negative".into()).into());
    }
    ensure_title_exists(&state.pool, title_id).await?;

    let entry = MediaRepo::create(&state.pool, title_id, &input).await?;
    tracing::info!(title_id, media_id = entry.id, user_id = auth.user_id, "Media entry added");

    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// DELETE /api/v1/titles/{id}/media/{media_id}
pub async fn delete_media(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((title_id, media_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if !MediaRepo::delete(&state.pool, title_id, media_id).await? {
        return Err(AppError::not_found("Media entry", media_id));
    }
    tracing::info!(title_id, media_id, user_id = auth.user_id, "Media entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// GET /api/v1/titles/{id}/images/{image_id}.{format}
///
/// Stream a stored image. The extension must match the stored format.
pub async fn get_image(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path((title_id, file_name)): Path<(DbId, String)>,
) -> AppResult<Response> {
    let (image_id, format) = parse_image_file_name(&file_name)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid image name '{file_name}'")))?;

    let image = TitleRepo::find_image(&state.pool, title_id, image_id)
        .await?
        .filter(|img| img.format.eq_ignore_ascii_case(format))
        .ok_or(AppError::not_found("Image", image_id))?;

    let bytes = match tokio::fs::read(&image.source_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(title_id, image_id, path = %image.source_path, "Image file missing");
            return Err(AppError::not_found("Image", image_id));
        }
        Err(e) => return Err(AppError::InternalError(format!("Failed to read image: {e}"))),
    };

    Ok(([(CONTENT_TYPE, image_content_type(&image.format))], Body::from(bytes)).into_response())
}

fn parse_image_file_name(file_name: &str) -> Option<(DbId, &str)> {
    let (id, format) = file_name.rsplit_once('.')?;
    let id = id.parse().ok()?;
    (!format.is_empty()).then_some((id, format))
}

fn image_content_type(format: &str) -> &'static str {
    match format.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_title_exists(pool: &DbPool, title_id: DbId) -> AppResult<()> {
    TitleRepo::find_by_id(pool, title_id)
        .await?
        .map(|_| ())
        .ok_or(AppError::not_found("Title", title_id))
}

/// The caller's watchlist row for `title_id`.
///
/// 404 when the title does not exist; a validation error when it exists but
/// is not on the caller's watchlist.
pub(crate) async fn require_watchlisted(
    pool: &DbPool,
    user_id: DbId,
    title_id: DbId,
) -> AppResult<UserTitleDetails> {
    if let Some(details) = TitleRepo::user_details(pool, user_id, title_id).await? {
        return Ok(details);
    }
    ensure_title_exists(pool, title_id).await?;
    Err(CoreError::Validation(format!("title {title_id} is not on the watchlist")).into())
}

fn validate_upsert(input: &UpsertTitle) -> Result<(), CoreError> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("name must not be empty".into()));
    }
    if input.runtime.is_some_and(|r| r < 0) {
        return Err(CoreError::Validation("runtime must not be negative".into()));
    }
    for image in &input.images {
        if image.format.trim().is_empty() || image.image_type.trim().is_empty() {
            return Err(CoreError::Validation("images need a type and a format".into()));
        }
    }
    let mut season_numbers: Vec<i32> = input.seasons.iter().map(|s| s.season_number).collect();
    season_numbers.sort_unstable();
    if season_numbers.windows(2).any(|w| w[0] == w[1]) {
        return Err(CoreError::Validation("season numbers must be unique".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_file_names() {
        assert_eq!(parse_image_file_name("12.jpg"), Some((12, "jpg")));
        assert_eq!(parse_image_file_name("12"), None);
        assert_eq!(parse_image_file_name("abc.png"), None);
        assert_eq!(parse_image_file_name("12."), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(image_content_type("JPG"), "image/jpeg");
        assert_eq!(image_content_type("webp"), "image/webp");
        assert_eq!(image_content_type("tiff"), "application/octet-stream");
    }
}
