use bytes::Bytes;
use tracing::{debug, info};

use crate::email;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::{StoreError, User};

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            // Also covers the race where two requests pass the
            // pre-check and the store's unique constraint fires.
            StoreError::EmailTaken => ApiError::EmailAlreadyUsed,
            StoreError::Backend(e) => ApiError::Internal(e),
        }
    }
}

/// Create a new record. A non-zero id in the input is ignored; the
/// store assigns a fresh one.
pub async fn create(state: &AppState, mut user: User) -> Result<User, ApiError> {
    if !email::is_valid(&user.email) {
        return Err(ApiError::InvalidEmail);
    }
    user.id = 0;
    if email_used_by_other(state, &user).await? {
        return Err(ApiError::EmailAlreadyUsed);
    }
    let saved = state.store.save(user).await?;
    info!(user_id = saved.id, email = %saved.email, "user created");
    Ok(saved)
}

pub async fn get_all(state: &AppState) -> Result<Vec<User>, ApiError> {
    Ok(state.store.find_all().await?)
}

pub async fn get(state: &AppState, id: i64) -> Result<User, ApiError> {
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or(ApiError::UserNotFound)
}

/// Overwrite an existing record. Checks run in a fixed order: email
/// format, then existence, then uniqueness.
pub async fn update(state: &AppState, user: User) -> Result<User, ApiError> {
    if !email::is_valid(&user.email) {
        return Err(ApiError::InvalidEmail);
    }
    if !state.store.exists(user.id).await? {
        return Err(ApiError::UserNotFound);
    }
    if email_used_by_other(state, &user).await? {
        return Err(ApiError::EmailAlreadyUsed);
    }
    let saved = state.store.save(user).await?;
    info!(user_id = saved.id, email = %saved.email, "user updated");
    Ok(saved)
}

pub async fn remove(state: &AppState, id: i64) -> Result<(), ApiError> {
    if !state.store.exists(id).await? {
        return Err(ApiError::UserNotFound);
    }
    state.store.delete(id).await?;
    info!(user_id = id, "user deleted");
    Ok(())
}

/// Write an uploaded image into the storage area under `name`.
/// The area must already be provisioned.
pub async fn store_image(state: &AppState, name: &str, bytes: Bytes) -> Result<(), ApiError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(ApiError::BadRequest("invalid file name".into()));
    }
    if !state.files.exists().await {
        return Err(ApiError::FileStorageNotPrepared);
    }
    state.files.store(name, bytes).await?;
    debug!(name, "image stored");
    Ok(())
}

/// True iff some *other* record already carries this email. On create
/// the input id is zero, which no stored record ever has, so any match
/// is a collision; on update a record may keep its own email.
async fn email_used_by_other(state: &AppState, user: &User) -> Result<bool, ApiError> {
    Ok(match state.store.find_by_email(&user.email).await? {
        Some(existing) => existing.id != user.id,
        None => false,
    })
}
