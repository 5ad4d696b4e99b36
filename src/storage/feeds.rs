use super::schema::Database;
use super::types::{Feed, FeedListing, StorageError};

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Register a feed. Urls are globally unique; a duplicate surfaces as
    /// `StorageError::Conflict`.
    pub async fn create_feed(
        &self,
        name: &str,
        url: &str,
        user_id: i64,
    ) -> Result<Feed, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            INSERT INTO feeds (name, url, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, url, user_id, last_fetched_at, created_at, updated_at
        "#,
        )
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(feed)
    }

    /// Look up a feed by url.
    pub async fn get_feed_by_url(&self, url: &str) -> Result<Feed, StorageError> {
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            SELECT id, name, url, user_id, last_fetched_at, created_at, updated_at
            FROM feeds
            WHERE url = ?
        "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(feed)
    }

    /// All feeds with their creator's name, in creation order.
    pub async fn list_feeds(&self) -> Result<Vec<FeedListing>, StorageError> {
        let feeds = sqlx::query_as::<_, FeedListing>(
            r#"
            SELECT f.name, f.url, u.name AS user_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(feeds)
    }

    /// The least-recently-fetched feed.
    ///
    /// SQLite sorts NULL first in ascending order, so never-fetched feeds
    /// always win; the id tiebreak keeps equal timestamps deterministic
    /// (creation order). `StorageError::NotFound` when no feeds exist.
    pub async fn next_feed_to_fetch(&self) -> Result<Feed, StorageError> {
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            SELECT id, name, url, user_id, last_fetched_at, created_at, updated_at
            FROM feeds
            ORDER BY last_fetched_at ASC, id ASC
            LIMIT 1
        "#,
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(feed)
    }

    /// Stamp a feed as fetched. Called by the scheduler before the actual
    /// download, so a failing feed still counts as visited for the round.
    pub async fn mark_feed_fetched(
        &self,
        feed_id: i64,
        fetched_at: i64,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
            .bind(fetched_at)
            .bind(fetched_at)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, StorageError};

    async fn db_with_user() -> (Database, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_next_feed_empty_is_not_found() {
        let (db, _) = db_with_user().await;
        match db.next_feed_to_fetch().await {
            Err(StorageError::NotFound) => {}
            other => panic!("Expected NotFound, got {:?}", other.map(|f| f.url)),
        }
    }

    #[tokio::test]
    async fn test_next_feed_prefers_never_fetched() {
        let (db, user_id) = db_with_user().await;
        let f1 = db
            .create_feed("One", "http://one/rss", user_id)
            .await
            .unwrap();
        let f2 = db
            .create_feed("Two", "http://two/rss", user_id)
            .await
            .unwrap();

        // Both never fetched: creation order breaks the tie
        assert_eq!(db.next_feed_to_fetch().await.unwrap().id, f1.id);

        // A fetched feed loses to a never-fetched one
        db.mark_feed_fetched(f1.id, 1_700_000_000).await.unwrap();
        assert_eq!(db.next_feed_to_fetch().await.unwrap().id, f2.id);

        // Both fetched: the older timestamp wins
        db.mark_feed_fetched(f2.id, 1_700_000_500).await.unwrap();
        assert_eq!(db.next_feed_to_fetch().await.unwrap().id, f1.id);
    }

    #[tokio::test]
    async fn test_duplicate_feed_url_is_conflict() {
        let (db, user_id) = db_with_user().await;
        db.create_feed("One", "http://one/rss", user_id)
            .await
            .unwrap();

        match db.create_feed("Other name", "http://one/rss", user_id).await {
            Err(StorageError::Conflict) => {}
            other => panic!("Expected Conflict, got {:?}", other.map(|f| f.url)),
        }
    }
}
