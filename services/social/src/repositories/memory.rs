//! In-process implementation of the storage port
//!
//! Mirrors the PostgreSQL adapter: insertion order is store order, username and
//! email are unique, and a follow toggle applies under a single lock so readers
//! never observe half of it.

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use rand::seq::SliceRandom;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{EMAIL_CONSTRAINT, FollowOutcome, SocialStore, USERNAME_CONSTRAINT};
use crate::models::{
    Connections, NewUser, Notification, NotificationType, NotificationView, User, UserSummary,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    /// `(follower, following)` in creation order
    follows: Vec<(Uuid, Uuid)>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn summaries(&self, ids: impl Iterator<Item = Uuid>) -> Vec<UserSummary> {
        ids.filter_map(|id| self.user(id).map(UserSummary::from))
            .collect()
    }

    fn check_unique(&self, id: Uuid, username: &str, email: &str) -> DatabaseResult<()> {
        let others = self.users.iter().filter(|u| u.id != id);
        for other in others {
            if other.username == username {
                return Err(DatabaseError::UniqueViolation(USERNAME_CONSTRAINT.to_string()));
            }
            if other.email == email {
                return Err(DatabaseError::UniqueViolation(EMAIL_CONSTRAINT.to_string()));
            }
        }
        Ok(())
    }
}

/// Social store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications currently stored, across all recipients
    pub async fn notification_count(&self) -> usize {
        self.state.lock().await.notifications.len()
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn create_user(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut state = self.state.lock().await;
        let id = Uuid::new_v4();
        state.check_unique(id, &new_user.username, &new_user.email)?;

        let now = Utc::now();
        let user = User {
            id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            full_name: new_user.full_name.clone(),
            bio: String::new(),
            link: String::new(),
            profile_img: String::new(),
            cover_img: String::new(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.state.lock().await.user(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn save_user(&self, user: &User) -> DatabaseResult<User> {
        let mut state = self.state.lock().await;
        state.check_unique(user.id, &user.username, &user.email)?;

        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))?;

        stored.username = user.username.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.full_name = user.full_name.clone();
        stored.bio = user.bio.clone();
        stored.link = user.link.clone();
        stored.profile_img = user.profile_img.clone();
        stored.cover_img = user.cover_img.clone();
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn search_users(&self, query: &str) -> DatabaseResult<Vec<UserSummary>> {
        let needle = query.to_lowercase();
        let state = self.state.lock().await;

        Ok(state
            .users
            .iter()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .map(UserSummary::from)
            .collect())
    }

    async fn list_followers(&self, user_id: Uuid) -> DatabaseResult<Vec<UserSummary>> {
        let state = self.state.lock().await;
        let ids = state
            .follows
            .iter()
            .filter(|(_, following)| *following == user_id)
            .map(|(follower, _)| *follower);

        Ok(state.summaries(ids))
    }

    async fn list_following(&self, user_id: Uuid) -> DatabaseResult<Vec<UserSummary>> {
        let state = self.state.lock().await;
        let ids = state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user_id)
            .map(|(_, following)| *following);

        Ok(state.summaries(ids))
    }

    async fn load_connections(&self, user_ids: &[Uuid]) -> DatabaseResult<Vec<Connections>> {
        let state = self.state.lock().await;
        Ok(Connections::assemble(user_ids, &state.follows))
    }

    async fn find_summaries(
        &self,
        ids: &[Uuid],
        limit: usize,
    ) -> DatabaseResult<Vec<UserSummary>> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let state = self.state.lock().await;

        Ok(state
            .users
            .iter()
            .filter(|u| wanted.contains(&u.id))
            .take(limit)
            .map(UserSummary::from)
            .collect())
    }

    async fn sample_summaries(
        &self,
        exclude: &[Uuid],
        limit: usize,
    ) -> DatabaseResult<Vec<UserSummary>> {
        let excluded: HashSet<&Uuid> = exclude.iter().collect();
        let state = self.state.lock().await;

        let eligible: Vec<&User> = state
            .users
            .iter()
            .filter(|u| !excluded.contains(&u.id))
            .collect();

        let mut rng = rand::thread_rng();
        Ok(eligible
            .choose_multiple(&mut rng, limit)
            .map(|u| UserSummary::from(*u))
            .collect())
    }

    async fn toggle_follow(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> DatabaseResult<Option<FollowOutcome>> {
        let mut state = self.state.lock().await;

        if state.user(actor_id).is_none() || state.user(target_id).is_none() {
            return Ok(None);
        }

        let edge = (actor_id, target_id);
        if let Some(position) = state.follows.iter().position(|e| *e == edge) {
            state.follows.remove(position);
            return Ok(Some(FollowOutcome::Unfollowed));
        }

        state.follows.push(edge);
        state
            .notifications
            .push(Notification::new(NotificationType::Follow, actor_id, target_id));

        Ok(Some(FollowOutcome::Followed))
    }

    async fn list_notifications(&self, recipient: Uuid) -> DatabaseResult<Vec<NotificationView>> {
        let state = self.state.lock().await;

        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.to_user_id == recipient)
            .filter_map(|n| {
                state.user(n.from_user_id).map(|from| NotificationView {
                    id: n.id,
                    notification_type: n.notification_type,
                    from: UserSummary::from(from),
                    to: n.to_user_id,
                    read: n.read,
                    created_at: n.created_at,
                })
            })
            .collect())
    }

    async fn delete_notifications(&self, recipient: Uuid) -> DatabaseResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.notifications.len();
        state.notifications.retain(|n| n.to_user_id != recipient);

        Ok((before - state.notifications.len()) as u64)
    }

    async fn delete_notification(&self, id: Uuid, recipient: Uuid) -> DatabaseResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.id == id && n.to_user_id == recipient));

        Ok(state.notifications.len() < before)
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seed_user;

    #[tokio::test]
    async fn test_duplicate_username_is_a_unique_violation() {
        let store = MemoryStore::new();
        seed_user(&store, "ada").await;

        let result = store
            .create_user(&NewUser {
                username: "ada".to_string(),
                email: "other@example.com".to_string(),
                full_name: "Other".to_string(),
                password_hash: "hash".to_string(),
            })
            .await;

        match result {
            Err(DatabaseError::UniqueViolation(constraint)) => {
                assert_eq!(constraint, USERNAME_CONSTRAINT)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_toggle_follow_creates_and_removes_edge() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada").await;
        let bob = seed_user(&store, "bob").await;

        let outcome = store.toggle_follow(ada.id, bob.id).await.unwrap();
        assert_eq!(outcome, Some(FollowOutcome::Followed));
        assert_eq!(store.list_followers(bob.id).await.unwrap()[0].id, ada.id);
        assert_eq!(store.notification_count().await, 1);

        let outcome = store.toggle_follow(ada.id, bob.id).await.unwrap();
        assert_eq!(outcome, Some(FollowOutcome::Unfollowed));
        assert!(store.list_followers(bob.id).await.unwrap().is_empty());
        assert!(store.list_following(ada.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_follow_with_unknown_user_returns_none() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada").await;

        let outcome = store.toggle_follow(ada.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(outcome, None);
        assert_eq!(store.notification_count().await, 0);
    }

    #[tokio::test]
    async fn test_sample_respects_exclusions_and_limit() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada").await;
        for name in ["bob", "cy", "dee", "eve"] {
            seed_user(&store, name).await;
        }

        let sample = store.sample_summaries(&[ada.id], 3).await.unwrap();
        assert_eq!(sample.len(), 3);
        assert!(sample.iter().all(|s| s.id != ada.id));

        let everyone_else = store.sample_summaries(&[ada.id], 10).await.unwrap();
        assert_eq!(everyone_else.len(), 4);
    }

    #[tokio::test]
    async fn test_delete_notification_checks_recipient() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada").await;
        let bob = seed_user(&store, "bob").await;
        store.toggle_follow(ada.id, bob.id).await.unwrap();

        let notification = store.list_notifications(bob.id).await.unwrap().remove(0);

        assert!(!store.delete_notification(notification.id, ada.id).await.unwrap());
        assert!(store.delete_notification(notification.id, bob.id).await.unwrap());
        assert!(store.list_notifications(bob.id).await.unwrap().is_empty());
    }
}
