//! Notification retrieval and deletion for the recipient

use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::NotificationView,
    repositories::SocialStore,
};

/// All notifications addressed to `user_id`, newest first
pub async fn list(store: &dyn SocialStore, user_id: Uuid) -> ApiResult<Vec<NotificationView>> {
    Ok(store.list_notifications(user_id).await?)
}

/// Delete every notification addressed to `user_id`
pub async fn clear(store: &dyn SocialStore, user_id: Uuid) -> ApiResult<u64> {
    let deleted = store.delete_notifications(user_id).await?;
    info!("Deleted {} notifications for {}", deleted, user_id);
    Ok(deleted)
}

/// Delete one notification; only its recipient may do so
pub async fn delete_one(
    store: &dyn SocialStore,
    user_id: Uuid,
    notification_id: Uuid,
) -> ApiResult<()> {
    if store.delete_notification(notification_id, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("Notification not found".to_string()))
    }
}
