//! Handlers for the caller's own account and settings.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use homestead_core::settings::parse_settings_patch;
use homestead_db::models::user::UserResponse;
use homestead_db::repositories::{SettingsRepo, UserRepo};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/user/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::not_found("User", auth.user_id))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

/// GET /api/v1/user/settings
///
/// The default row is created on first access.
pub async fn get_settings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let settings = SettingsRepo::get_or_create(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PATCH /api/v1/user/settings
///
/// Accepts a flat object of allow-listed fields. Unknown fields are rejected
/// before anything is written.
pub async fn update_settings(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(patch): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let updates = parse_settings_patch(&patch)?;
    let settings = SettingsRepo::update(&state.pool, auth.user_id, &updates).await?;

    tracing::info!(user_id = auth.user_id, fields = updates.len(), "Settings updated");
    Ok(Json(DataResponse { data: settings }))
}
