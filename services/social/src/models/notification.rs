//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::UserSummary;

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Follow,
    Like,
    Comment,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Follow => "follow",
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(NotificationType::Follow),
            "like" => Ok(NotificationType::Like),
            "comment" => Ok(NotificationType::Comment),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

/// Notification entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Unread notification stamped now
    pub fn new(notification_type: NotificationType, from_user_id: Uuid, to_user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            notification_type,
            from_user_id,
            to_user_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Notification as returned to its recipient, with the actor expanded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub from: UserSummary,
    pub to: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
