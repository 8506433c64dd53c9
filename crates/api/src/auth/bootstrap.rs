//! First-run account creation.
//!
//! There is no sign-up endpoint. On startup the server creates the account
//! named by `BOOTSTRAP_USERNAME`/`BOOTSTRAP_PASSWORD` if it does not exist yet.

use homestead_core::error::CoreError;
use homestead_db::models::user::{CreateUser, User};
use homestead_db::repositories::UserRepo;
use homestead_db::DbPool;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};

/// Create `username` with `password` unless an account with that name exists.
///
/// Returns the created user, or `None` when the account was already there.
pub async fn ensure_user(pool: &DbPool, username: &str, password: &str) -> AppResult<Option<User>> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CoreError::Validation("username must not be empty".into()).into());
    }
    if UserRepo::find_by_username(pool, username).await?.is_some() {
        return Ok(None);
    }
    validate_password_strength(password, MIN_PASSWORD_LENGTH).map_err(CoreError::Validation)?;

    let password_hash = hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            password_hash,
        },
    )
    .await?;
    Ok(Some(user))
}
