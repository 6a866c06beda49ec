//! PostgreSQL implementation of the storage port

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, warn};
use uuid::Uuid;

use super::{FollowOutcome, SocialStore};
use crate::models::{
    Connections, NewUser, Notification, NotificationType, NotificationView, User, UserSummary,
};

macro_rules! user_columns {
    () => {
        "id, username, email, password_hash, full_name, bio, link, profile_img, cover_img, created_at, updated_at"
    };
}

macro_rules! summary_columns {
    () => {
        "u.id, u.username, u.full_name, u.profile_img, u.bio"
    };
}

/// Apply pending schema migrations
pub async fn migrate(pool: &PgPool) -> DatabaseResult<()> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}

/// Escape `%`, `_` and `\` so the input matches literally inside a LIKE pattern
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Social store backed by PostgreSQL
#[derive(Clone)]
pub struct PgSocialStore {
    pool: PgPool,
}

impl PgSocialStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn notification_view(row: &PgRow) -> DatabaseResult<NotificationView> {
        let kind: String = row.get("type");
        let notification_type = kind
            .parse::<NotificationType>()
            .map_err(|e| DatabaseError::Query(sqlx::Error::Decode(e.into())))?;

        Ok(NotificationView {
            id: row.get("id"),
            notification_type,
            from: UserSummary {
                id: row.get("from_id"),
                username: row.get("from_username"),
                full_name: row.get("from_full_name"),
                profile_img: row.get("from_profile_img"),
                bio: row.get("from_bio"),
            },
            to: row.get("to_user_id"),
            read: row.get("read"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl SocialStore for PgSocialStore {
    async fn create_user(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let user = sqlx::query_as::<_, User>(concat!(
            "INSERT INTO users (id, username, email, password_hash, full_name) ",
            "VALUES ($1, $2, $3, $4, $5) ",
            "RETURNING ",
            user_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.full_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save_user(&self, user: &User) -> DatabaseResult<User> {
        let saved = sqlx::query_as::<_, User>(concat!(
            "UPDATE users SET username = $2, email = $3, password_hash = $4, full_name = $5, ",
            "bio = $6, link = $7, profile_img = $8, cover_img = $9, updated_at = NOW() ",
            "WHERE id = $1 RETURNING ",
            user_columns!()
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.bio)
        .bind(&user.link)
        .bind(&user.profile_img)
        .bind(&user.cover_img)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn search_users(&self, query: &str) -> DatabaseResult<Vec<UserSummary>> {
        let pattern = format!("%{}%", escape_like(query));

        let users = sqlx::query_as::<_, UserSummary>(concat!(
            "SELECT ",
            summary_columns!(),
            r#" FROM users u WHERE u.username ILIKE $1 ESCAPE '\' ORDER BY u.created_at"#
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_followers(&self, user_id: Uuid) -> DatabaseResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(concat!(
            "SELECT ",
            summary_columns!(),
            " FROM follows f JOIN users u ON u.id = f.follower_id ",
            "WHERE f.following_id = $1 ORDER BY f.created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_following(&self, user_id: Uuid) -> DatabaseResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(concat!(
            "SELECT ",
            summary_columns!(),
            " FROM follows f JOIN users u ON u.id = f.following_id ",
            "WHERE f.follower_id = $1 ORDER BY f.created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn load_connections(&self, user_ids: &[Uuid]) -> DatabaseResult<Vec<Connections>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT follower_id, following_id
            FROM follows
            WHERE follower_id = ANY($1) OR following_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        let edges: Vec<(Uuid, Uuid)> = rows
            .iter()
            .map(|row| (row.get("follower_id"), row.get("following_id")))
            .collect();

        Ok(Connections::assemble(user_ids, &edges))
    }

    async fn find_summaries(
        &self,
        ids: &[Uuid],
        limit: usize,
    ) -> DatabaseResult<Vec<UserSummary>> {
        if ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, UserSummary>(concat!(
            "SELECT ",
            summary_columns!(),
            " FROM users u WHERE u.id = ANY($1) ORDER BY u.created_at LIMIT $2"
        ))
        .bind(ids)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn sample_summaries(
        &self,
        exclude: &[Uuid],
        limit: usize,
    ) -> DatabaseResult<Vec<UserSummary>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, UserSummary>(concat!(
            "SELECT ",
            summary_columns!(),
            " FROM users u WHERE u.id <> ALL($1) ORDER BY random() LIMIT $2"
        ))
        .bind(exclude)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn toggle_follow(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> DatabaseResult<Option<FollowOutcome>> {
        let mut tx = self.pool.begin().await?;

        // Serializes toggles by the same actor. NO KEY UPDATE leaves the row open
        // to the KEY SHARE locks taken by foreign-key checks, so mutual follows
        // between two users do not deadlock.
        let actor: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
                .bind(actor_id)
                .fetch_optional(&mut *tx)
                .await?;
        let target: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?;

        if actor.is_none() || target.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(actor_id)
            .bind(target_id)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() > 0 {
            tx.commit().await?;
            return Ok(Some(FollowOutcome::Unfollowed));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(actor_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() > 0 {
            let notification = Notification::new(NotificationType::Follow, actor_id, target_id);
            sqlx::query(
                r#"
                INSERT INTO notifications (id, type, from_user_id, to_user_id, read, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(notification.id)
            .bind(notification.notification_type.as_str())
            .bind(notification.from_user_id)
            .bind(notification.to_user_id)
            .bind(notification.read)
            .bind(notification.created_at)
            .execute(&mut *tx)
            .await?;
        } else {
            // Guard only: the actor lock keeps the edge from appearing between the delete and the insert
            warn!(
                "Follow edge {} -> {} already present on insert; skipping notification",
                actor_id, target_id
            );
        }

        tx.commit().await?;
        Ok(Some(FollowOutcome::Followed))
    }

    async fn list_notifications(&self, recipient: Uuid) -> DatabaseResult<Vec<NotificationView>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.type, n.to_user_id, n.read, n.created_at,
                   u.id AS from_id, u.username AS from_username, u.full_name AS from_full_name,
                   u.profile_img AS from_profile_img, u.bio AS from_bio
            FROM notifications n
            JOIN users u ON u.id = n.from_user_id
            WHERE n.to_user_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::notification_view).collect()
    }

    async fn delete_notifications(&self, recipient: Uuid) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE to_user_id = $1")
            .bind(recipient)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: Uuid, recipient: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND to_user_id = $2")
            .bind(id)
            .bind(recipient)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("ada"), "ada");
        assert_eq!(escape_like("100%"), r"100\%");
        assert_eq!(escape_like("a_b"), r"a\_b");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
    }
}
