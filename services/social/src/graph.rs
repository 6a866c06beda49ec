//! Social graph operations: follower lists, follow toggling and user search

use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::UserSummary,
    repositories::{FollowOutcome, SocialStore},
};

/// Users following `username`, in the order they followed
pub async fn get_followers(store: &dyn SocialStore, username: &str) -> ApiResult<Vec<UserSummary>> {
    let user = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    Ok(store.list_followers(user.id).await?)
}

/// Users `username` follows, in the order they were followed
pub async fn get_following(store: &dyn SocialStore, username: &str) -> ApiResult<Vec<UserSummary>> {
    let user = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    Ok(store.list_following(user.id).await?)
}

/// Follow `target_id` as `actor_id`, or unfollow if the edge already exists.
///
/// Following emits a follow notification to the target in the same commit.
pub async fn follow_unfollow(
    store: &dyn SocialStore,
    actor_id: Uuid,
    target_id: Uuid,
) -> ApiResult<FollowOutcome> {
    if actor_id == target_id {
        return Err(ApiError::BadRequest(
            "You can't follow/unfollow yourself".to_string(),
        ));
    }

    let outcome = store
        .toggle_follow(actor_id, target_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    info!("User {} {:?} user {}", actor_id, outcome, target_id);
    Ok(outcome)
}

/// Case-insensitive substring search on username
pub async fn search_users(store: &dyn SocialStore, query: &str) -> ApiResult<Vec<UserSummary>> {
    Ok(store.search_users(query).await?)
}
