//! Command operations: one entry point per CLI command.
//!
//! Operations return domain values or an [`OpError`]; formatting for
//! human display stays in the dispatcher. Operations acting on behalf of
//! a user take the resolved [`User`] explicitly — [`require_user`] turns
//! the configured current-user name into that value once per invocation.

use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::storage::{
    Database, Feed, FeedListing, FollowSummary, PostWithFeed, StorageError, User,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum OpError {
    /// A referenced user, feed or follow does not exist
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness invariant was violated
    #[error("{0}")]
    Conflict(String),

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// The feed row was created but the creator's follow was not. The
    /// feed is not rolled back; the caller can retry with an explicit
    /// follow.
    #[error("feed {name:?} was added, but could not be followed (retry with: follow {url}): {source}")]
    PartialFollow {
        name: String,
        url: String,
        source: StorageError,
    },

    /// Any other storage failure
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for OpError {
    fn from(err: StorageError) -> Self {
        OpError::Storage(err)
    }
}

// ============================================================================
// Users
// ============================================================================

/// Resolve the configured current user.
pub async fn require_user(db: &Database, config: &Config) -> Result<User, OpError> {
    let name = config.current_user.as_deref().ok_or_else(|| {
        OpError::Validation("no user is logged in; use the register or login command first".into())
    })?;

    match db.get_user_by_name(name).await {
        Ok(user) => Ok(user),
        Err(StorageError::NotFound) => {
            Err(OpError::NotFound(format!("user {name:?} does not exist")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Create a user. The dispatcher records the new user as current.
pub async fn register(db: &Database, name: &str) -> Result<User, OpError> {
    if name.trim().is_empty() {
        return Err(OpError::Validation("a user name is required".into()));
    }

    match db.create_user(name).await {
        Ok(user) => Ok(user),
        Err(StorageError::Conflict) => {
            Err(OpError::Conflict(format!("user {name:?} already exists")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Check that a user exists so the dispatcher can record them as current.
pub async fn login(db: &Database, name: &str) -> Result<User, OpError> {
    match db.get_user_by_name(name).await {
        Ok(user) => Ok(user),
        Err(StorageError::NotFound) => {
            Err(OpError::NotFound(format!("user {name:?} does not exist")))
        }
        Err(e) => Err(e.into()),
    }
}

/// All registered users.
pub async fn users(db: &Database) -> Result<Vec<User>, OpError> {
    Ok(db.list_users().await?)
}

/// Administrative reset: deletes all users and everything they own.
pub async fn reset(db: &Database) -> Result<(), OpError> {
    Ok(db.reset_users().await?)
}

// ============================================================================
// Feeds & Follows
// ============================================================================

/// Create a feed and immediately follow it as its creator.
///
/// If the follow write fails the feed row is kept and the error names the
/// created feed so the caller can follow it explicitly.
pub async fn add_feed(db: &Database, user: &User, name: &str, url: &str) -> Result<Feed, OpError> {
    if name.trim().is_empty() {
        return Err(OpError::Validation("a feed name is required".into()));
    }
    validate_feed_url(url)?;

    let feed = match db.create_feed(name, url, user.id).await {
        Ok(feed) => feed,
        Err(StorageError::Conflict) => {
            return Err(OpError::Conflict(
                "feed already exists, subscribe to it with the follow command".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = db.create_follow(user.id, feed.id).await {
        return Err(OpError::PartialFollow {
            name: feed.name.clone(),
            url: feed.url.clone(),
            source: e,
        });
    }

    Ok(feed)
}

/// All registered feeds with their creator's name.
pub async fn feeds(db: &Database) -> Result<Vec<FeedListing>, OpError> {
    Ok(db.list_feeds().await?)
}

/// Follow an already-registered feed, resolved by url.
pub async fn follow(db: &Database, user: &User, url: &str) -> Result<FollowSummary, OpError> {
    let feed = resolve_feed(db, url).await?;

    match db.create_follow(user.id, feed.id).await {
        Ok(summary) => Ok(summary),
        Err(StorageError::Conflict) => {
            Err(OpError::Conflict("feed is already followed".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove the user's own follow of the feed at `url`. Other users'
/// follows of the same feed are untouched.
pub async fn unfollow(db: &Database, user: &User, url: &str) -> Result<(), OpError> {
    let feed = resolve_feed(db, url).await?;

    match db.delete_follow(user.id, feed.id).await {
        Ok(()) => Ok(()),
        Err(StorageError::NotFound) => Err(OpError::NotFound(format!(
            "user {:?} does not follow that feed",
            user.name
        ))),
        Err(e) => Err(e.into()),
    }
}

/// The feeds the user follows.
pub async fn following(db: &Database, user: &User) -> Result<Vec<FollowSummary>, OpError> {
    Ok(db.follows_for_user(user.id).await?)
}

// ============================================================================
// Posts
// ============================================================================

/// Recent posts from the user's followed feeds, most recent first.
pub async fn browse(db: &Database, user: &User, limit: i64) -> Result<Vec<PostWithFeed>, OpError> {
    if limit <= 0 {
        return Err(OpError::Validation(
            "limit must be a positive number".into(),
        ));
    }
    Ok(db.posts_for_user(user.id, limit).await?)
}

// ============================================================================
// Helpers
// ============================================================================

async fn resolve_feed(db: &Database, url: &str) -> Result<Feed, OpError> {
    match db.get_feed_by_url(url).await {
        Ok(feed) => Ok(feed),
        Err(StorageError::NotFound) => Err(OpError::NotFound(format!(
            "feed {url:?} is not registered"
        ))),
        Err(e) => Err(e.into()),
    }
}

fn validate_feed_url(url: &str) -> Result<(), OpError> {
    let parsed =
        Url::parse(url).map_err(|e| OpError::Validation(format!("invalid feed url {url:?}: {e}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(OpError::Validation(format!(
            "feed url must be http or https, got {:?}",
            parsed.scheme()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_must_be_http() {
        assert!(validate_feed_url("https://example.com/feed.xml").is_ok());
        assert!(validate_feed_url("http://example.com/rss").is_ok());
        assert!(matches!(
            validate_feed_url("ftp://example.com/feed.xml"),
            Err(OpError::Validation(_))
        ));
        assert!(matches!(
            validate_feed_url("not a url"),
            Err(OpError::Validation(_))
        ));
    }
}
