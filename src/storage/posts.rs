use super::schema::Database;
use super::types::{NewPost, Post, PostWithFeed, StorageError};

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Store a post. Urls are globally unique; re-ingesting an item that
    /// is already stored surfaces as `StorageError::Conflict`, which the
    /// ingestor treats as a skip.
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (feed_id, url, title, description, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, feed_id, url, title, description, published_at, created_at, updated_at
        "#,
        )
        .bind(post.feed_id)
        .bind(&post.url)
        .bind(&post.title)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Posts from the user's followed feeds, most recent first. Posts
    /// without a publish date fall back to their ingestion time.
    pub async fn posts_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<PostWithFeed>, StorageError> {
        let posts = sqlx::query_as::<_, PostWithFeed>(
            r#"
            SELECT p.url, p.title, p.description, p.published_at, f.name AS feed_name
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            JOIN feeds f ON f.id = p.feed_id
            WHERE ff.user_id = ?
            ORDER BY COALESCE(p.published_at, p.created_at) DESC
            LIMIT ?
        "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
