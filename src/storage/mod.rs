//! SQLite storage gateway for users, feeds, follows and posts.
//!
//! Uniqueness invariants (user name, feed url, (user, feed) follow pair,
//! post url) are enforced by the schema and surfaced as
//! [`StorageError::Conflict`], never as driver-specific error codes.

mod feeds;
mod follows;
mod posts;
mod schema;
mod types;
mod users;

pub use schema::Database;
pub use types::{
    Feed, FeedListing, FollowSummary, NewPost, Post, PostWithFeed, StorageError, User,
};
