//! API models for request and response payloads

use serde::{Deserialize, Serialize};

pub mod notification;
pub mod user;

pub use notification::{Notification, NotificationType, NotificationView};
pub use user::{
    Connections, NewUser, RegisterRequest, UpdateUserRequest, User, UserProfile, UserSummary,
};

/// Plain acknowledgement returned by mutating endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for the bulk notification delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearNotificationsResponse {
    pub message: String,
    pub deleted: u64,
}
