use super::schema::Database;
use super::types::{FollowSummary, StorageError};

impl Database {
    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// Follow a feed. The (user, feed) pair is unique; following the same
    /// feed twice surfaces as `StorageError::Conflict`. Returns the follow
    /// joined with both names for display.
    pub async fn create_follow(
        &self,
        user_id: i64,
        feed_id: i64,
    ) -> Result<FollowSummary, StorageError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
        "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let summary = sqlx::query_as::<_, FollowSummary>(
            r#"
            SELECT u.name AS user_name, f.name AS feed_name
            FROM users u, feeds f
            WHERE u.id = ? AND f.id = ?
        "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Delete the (user, feed) follow. Scoped to the acting user: other
    /// users' follows of the same feed are untouched. `NotFound` if the
    /// user does not follow that feed.
    pub async fn delete_follow(&self, user_id: i64, feed_id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    /// All feeds the user follows, joined with both names.
    pub async fn follows_for_user(&self, user_id: i64) -> Result<Vec<FollowSummary>, StorageError> {
        let follows = sqlx::query_as::<_, FollowSummary>(
            r#"
            SELECT u.name AS user_name, f.name AS feed_name
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = ?
            ORDER BY ff.id
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(follows)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, StorageError};

    #[tokio::test]
    async fn test_double_follow_is_conflict() {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed("Blog", "http://x/feed.xml", user.id)
            .await
            .unwrap();

        let follow = db.create_follow(user.id, feed.id).await.unwrap();
        assert_eq!(follow.user_name, "alice");
        assert_eq!(follow.feed_name, "Blog");

        match db.create_follow(user.id, feed.id).await {
            Err(StorageError::Conflict) => {}
            other => panic!("Expected Conflict, got {:?}", other.map(|f| f.feed_name)),
        }

        // The failed second call leaves the list unchanged
        let follows = db.follows_for_user(user.id).await.unwrap();
        assert_eq!(follows.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_follow_is_not_found() {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed("Blog", "http://x/feed.xml", user.id)
            .await
            .unwrap();

        match db.delete_follow(user.id, feed.id).await {
            Err(StorageError::NotFound) => {}
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }
}
