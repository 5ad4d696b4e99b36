use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage gateway errors.
///
/// Uniqueness violations surface as [`StorageError::Conflict`] so callers
/// can implement duplicate-tolerant semantics without inspecting
/// driver-specific error codes.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The referenced row does not exist
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint was violated (duplicate user name, feed
    /// url, follow pair or post url)
    #[error("uniqueness constraint violated")]
    Conflict,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(sqlx::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db)
                if db.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                StorageError::Conflict
            }
            other => StorageError::Other(other),
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A registered account. Names are unique and case-sensitive.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A syndication source. `user_id` records who registered the feed; it is
/// informational, not an access-control owner.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    /// Unix seconds of the last poll, None until first fetched. Written
    /// only by the poll scheduler.
    pub last_fetched_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A follow row joined with the user and feed names, for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowSummary {
    pub user_name: String,
    pub feed_name: String,
}

/// A feed joined with its creator's name, for the feeds listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedListing {
    pub name: String,
    pub url: String,
    pub user_name: String,
}

/// A stored post. Posts are created by the ingestor and never updated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Candidate post built by the ingestor; the gateway assigns the id and
/// row timestamps.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub feed_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<i64>,
}

/// A post joined with its feed's name, for browsing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithFeed {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<i64>,
    pub feed_name: String,
}
