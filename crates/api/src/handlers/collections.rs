//! Handlers for user-owned collections and their title links.
//!
//! Collections nest one level deep. A collection owned by another user is
//! reported as not found.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use homestead_core::error::CoreError;
use homestead_core::types::DbId;
use homestead_core::watchlist::{validate_collection_name, validate_collection_parent};
use homestead_db::models::collection::{Collection, CreateCollection, UpdateCollection};
use homestead_db::repositories::{CollectionRepo, TitleRepo};
use homestead_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/collections
pub async fn list_collections(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let collections = CollectionRepo::list(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: collections }))
}

/// GET /api/v1/collections/{id}
pub async fn get_collection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let collection = find_owned(&state.pool, auth.user_id, id).await?;
    Ok(Json(DataResponse { data: collection }))
}

/// POST /api/v1/collections
pub async fn create_collection(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCollection>,
) -> AppResult<impl IntoResponse> {
    validate_collection_name(&input.name)?;
    if let Some(parent_id) = input.parent_collection_id {
        let parent = find_owned(&state.pool, auth.user_id, parent_id).await?;
        validate_collection_parent(None, parent.id, parent.parent_collection_id.is_some())?;
    }

    let collection = CollectionRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(collection_id = collection.id, user_id = auth.user_id, "Collection created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: collection })))
}

/// PUT /api/v1/collections/{id}
pub async fn update_collection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCollection>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = input.name.as_deref() {
        validate_collection_name(name)?;
    }
    find_owned(&state.pool, auth.user_id, id).await?;

    if let Some(parent_id) = input.parent_collection_id {
        let parent = find_owned(&state.pool, auth.user_id, parent_id).await?;
        validate_collection_parent(Some(id), parent.id, parent.parent_collection_id.is_some())?;
        if CollectionRepo::has_children(&state.pool, id).await? {
            return Err(CoreError::Validation(
                "a collection with children cannot be nested".into(),
            )
            .into());
        }
    }

    let collection = CollectionRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or(AppError::not_found("Collection", id))?;

    tracing::info!(collection_id = id, user_id = auth.user_id, "Collection updated");
    Ok(Json(DataResponse { data: collection }))
}

/// DELETE /api/v1/collections/{id}
///
/// Child collections are deleted with their parent.
pub async fn delete_collection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CollectionRepo::delete(&state.pool, auth.user_id, id).await? {
        return Err(AppError::not_found("Collection", id));
    }
    tracing::info!(collection_id = id, user_id = auth.user_id, "Collection deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/collections/{id}/titles/{title_id}
pub async fn add_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, title_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_owned(&state.pool, auth.user_id, id).await?;
    TitleRepo::find_by_id(&state.pool, title_id)
        .await?
        .ok_or(AppError::not_found("Title", title_id))?;

    let added = CollectionRepo::add_title(&state.pool, id, title_id).await?;
    tracing::info!(collection_id = id, title_id, user_id = auth.user_id, added, "Title linked to collection");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/collections/{id}/titles/{title_id}
pub async fn remove_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, title_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_owned(&state.pool, auth.user_id, id).await?;
    if !CollectionRepo::remove_title(&state.pool, id, title_id).await? {
        return Err(AppError::not_found("Collection title", title_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn find_owned(pool: &DbPool, user_id: DbId, id: DbId) -> AppResult<Collection> {
    CollectionRepo::find_by_id(pool, user_id, id)
        .await?
        .ok_or(AppError::not_found("Collection", id))
}
