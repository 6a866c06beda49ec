//! User model and the projections returned by the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

/// User entity as stored. Never serialized directly: it carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub bio: String,
    pub link: String,
    pub profile_img: String,
    pub cover_img: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal projection used wherever users are listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_img: String,
    pub bio: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            profile_img: user.profile_img.clone(),
            bio: user.bio.clone(),
        }
    }
}

/// Full user record minus the password, with the follow lists attached
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
    pub link: String,
    pub profile_img: String,
    pub cover_img: String,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user: User, connections: Connections) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            bio: user.bio,
            link: user.link,
            profile_img: user.profile_img,
            cover_img: user.cover_img,
            followers: connections.followers,
            following: connections.following,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Follower and following ids of one user, in edge-creation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connections {
    pub user_id: Uuid,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
}

impl Connections {
    /// Group `(follower, following)` edges by the requested users.
    ///
    /// Edges must arrive in creation order; each requested id yields exactly one
    /// entry, duplicates in `user_ids` are collapsed.
    pub fn assemble(user_ids: &[Uuid], edges: &[(Uuid, Uuid)]) -> Vec<Connections> {
        let mut seen = HashSet::new();
        user_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|&user_id| Connections {
                user_id,
                followers: edges
                    .iter()
                    .filter(|(_, following)| *following == user_id)
                    .map(|(follower, _)| *follower)
                    .collect(),
                following: edges
                    .iter()
                    .filter(|(follower, _)| *follower == user_id)
                    .map(|(_, following)| *following)
                    .collect(),
            })
            .collect()
    }
}

/// Insert payload; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

/// Request for user registration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// Partial profile update. Absent or empty fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_splits_edges_per_user() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let edges = vec![(a, b), (c, b), (b, a)];

        let connections = Connections::assemble(&[b, a, b], &edges);

        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].user_id, b);
        assert_eq!(connections[0].followers, vec![a, c]);
        assert_eq!(connections[0].following, vec![a]);
        assert_eq!(connections[1].user_id, a);
        assert_eq!(connections[1].followers, vec![b]);
        assert_eq!(connections[1].following, vec![b]);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = UserSummary {
            id: Uuid::nil(),
            username: "ada".to_string(),
            full_name: "Ada Lovelace".to_string(),
            profile_img: String::new(),
            bio: "analyst".to_string(),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["fullName"], "Ada Lovelace");
        assert_eq!(value["profileImg"], "");
        assert!(value.get("email").is_none());
    }
}
