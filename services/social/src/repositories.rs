//! Storage port for users, follow edges and notifications
//!
//! Every operation in the service goes through [`SocialStore`]. Two adapters
//! implement it: [`postgres::PgSocialStore`] for deployments and
//! [`memory::MemoryStore`] for tests and local demos.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{Connections, NewUser, NotificationView, User, UserSummary};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgSocialStore;

/// Constraint guarding username uniqueness
pub const USERNAME_CONSTRAINT: &str = "users_username_key";
/// Constraint guarding email uniqueness
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Result of toggling a follow edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowOutcome {
    /// Edge created and a follow notification emitted
    Followed,
    /// Edge removed
    Unfollowed,
}

#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Insert a user. Duplicate username or email yields `UniqueViolation`.
    async fn create_user(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    /// Persist the mutable profile fields of `user` and return the stored row
    async fn save_user(&self, user: &User) -> DatabaseResult<User>;

    /// Case-insensitive literal substring match on username
    async fn search_users(&self, query: &str) -> DatabaseResult<Vec<UserSummary>>;

    /// Users following `user_id`, oldest edge first
    async fn list_followers(&self, user_id: Uuid) -> DatabaseResult<Vec<UserSummary>>;

    /// Users `user_id` follows, oldest edge first
    async fn list_following(&self, user_id: Uuid) -> DatabaseResult<Vec<UserSummary>>;

    /// Follower and following ids for every requested user, in one round trip
    async fn load_connections(&self, user_ids: &[Uuid]) -> DatabaseResult<Vec<Connections>>;

    /// Summaries for up to `limit` of the given ids
    async fn find_summaries(&self, ids: &[Uuid], limit: usize)
    -> DatabaseResult<Vec<UserSummary>>;

    /// Up to `limit` uniformly sampled users whose id is not in `exclude`
    async fn sample_summaries(
        &self,
        exclude: &[Uuid],
        limit: usize,
    ) -> DatabaseResult<Vec<UserSummary>>;

    /// Follow `target_id` if `actor_id` does not already follow it, otherwise unfollow.
    ///
    /// The edge change and the follow notification commit together. Returns
    /// `None` when either user does not exist.
    async fn toggle_follow(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> DatabaseResult<Option<FollowOutcome>>;

    /// Notifications addressed to `recipient`, newest first
    async fn list_notifications(&self, recipient: Uuid) -> DatabaseResult<Vec<NotificationView>>;

    /// Delete all notifications addressed to `recipient`, returning how many went
    async fn delete_notifications(&self, recipient: Uuid) -> DatabaseResult<u64>;

    /// Delete one notification if it is addressed to `recipient`
    async fn delete_notification(&self, id: Uuid, recipient: Uuid) -> DatabaseResult<bool>;

    async fn health_check(&self) -> DatabaseResult<bool>;
}
