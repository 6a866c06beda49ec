//! Profile lookup, registration and profile updates

use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{NewUser, RegisterRequest, UpdateUserRequest, User, UserProfile},
    password::{hash_password, verify_password},
    repositories::SocialStore,
    validation::{validate_email, validate_full_name, validate_password, validate_username},
};

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Both password fields or neither; returns `(current, new)` when a change is requested
pub fn password_change(request: &UpdateUserRequest) -> ApiResult<Option<(&str, &str)>> {
    match (
        non_empty(&request.current_password),
        non_empty(&request.new_password),
    ) {
        (Some(current), Some(new)) => Ok(Some((current, new))),
        (None, None) => Ok(None),
        _ => Err(ApiError::BadRequest(
            "Please provide both current password and new password".to_string(),
        )),
    }
}

async fn with_connections(store: &dyn SocialStore, user: User) -> ApiResult<UserProfile> {
    let connections = store
        .load_connections(&[user.id])
        .await?
        .pop()
        .unwrap_or_default();

    Ok(UserProfile::new(user, connections))
}

/// Full profile of `username`, without the password
pub async fn get_profile(store: &dyn SocialStore, username: &str) -> ApiResult<UserProfile> {
    let user = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    with_connections(store, user).await
}

/// Create an account
pub async fn register(store: &dyn SocialStore, request: RegisterRequest) -> ApiResult<UserProfile> {
    validate_username(&request.username).map_err(ApiError::BadRequest)?;
    validate_email(&request.email).map_err(ApiError::BadRequest)?;
    validate_full_name(&request.full_name).map_err(ApiError::BadRequest)?;
    validate_password(&request.password).map_err(ApiError::BadRequest)?;

    let new_user = NewUser {
        username: request.username,
        email: request.email,
        full_name: request.full_name,
        password_hash: hash_password(&request.password)?,
    };

    let user = store.create_user(&new_user).await?;
    info!("Registered user {} ({})", user.username, user.id);

    with_connections(store, user).await
}

/// Apply a partial update to the caller's profile
pub async fn update_user(
    store: &dyn SocialStore,
    user_id: Uuid,
    request: UpdateUserRequest,
) -> ApiResult<UserProfile> {
    let mut user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    if let Some((current, new)) = password_change(&request)? {
        if !verify_password(current, &user.password_hash)? {
            return Err(ApiError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }
        validate_password(new).map_err(ApiError::BadRequest)?;
        user.password_hash = hash_password(new)?;
    }

    if let Some(username) = non_empty(&request.username) {
        validate_username(username).map_err(ApiError::BadRequest)?;
        user.username = username.to_string();
    }
    if let Some(email) = non_empty(&request.email) {
        validate_email(email).map_err(ApiError::BadRequest)?;
        user.email = email.to_string();
    }
    if let Some(full_name) = non_empty(&request.full_name) {
        validate_full_name(full_name).map_err(ApiError::BadRequest)?;
        user.full_name = full_name.to_string();
    }
    if let Some(bio) = non_empty(&request.bio) {
        user.bio = bio.to_string();
    }
    if let Some(link) = non_empty(&request.link) {
        user.link = link.to_string();
    }
    // Image fields carry references to already-uploaded blobs
    if let Some(profile_img) = non_empty(&request.profile_img) {
        user.profile_img = profile_img.to_string();
    }
    if let Some(cover_img) = non_empty(&request.cover_img) {
        user.cover_img = cover_img.to_string();
    }

    let saved = store.save_user(&user).await?;
    info!("Updated profile of {}", saved.id);

    with_connections(store, saved).await
}
