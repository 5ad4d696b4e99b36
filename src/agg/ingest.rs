use crate::storage::{Database, Feed, NewPost, Post, StorageError};

use super::fetcher::{ParsedFeed, ParsedItem};

/// Result of writing one candidate post.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The item was new and is now stored
    Stored(Post),
    /// A post with the same url already exists. Re-polling a feed hits
    /// this for every item seen before; it is the expected steady state,
    /// not a failure.
    Skipped,
}

/// Counts for one ingested feed document.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestSummary {
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Build a candidate post from a parsed item and write it through the
/// storage gateway.
///
/// Empty titles and descriptions are stored as NULL. A url conflict means
/// the item was already ingested on an earlier poll and maps to
/// [`IngestOutcome::Skipped`]; any other storage failure is the caller's
/// to report.
pub async fn ingest_item(
    db: &Database,
    feed_id: i64,
    item: &ParsedItem,
) -> Result<IngestOutcome, StorageError> {
    let candidate = NewPost {
        feed_id,
        url: item.link.clone(),
        title: non_empty(&item.title),
        description: non_empty(&item.description),
        published_at: item.published_at,
    };

    match db.create_post(&candidate).await {
        Ok(post) => Ok(IngestOutcome::Stored(post)),
        Err(StorageError::Conflict) => Ok(IngestOutcome::Skipped),
        Err(e) => Err(e),
    }
}

/// Ingest every item of a parsed feed.
///
/// Item failures are logged with the feed id for operator visibility and
/// do not stop the remaining items.
pub async fn ingest_feed(db: &Database, feed: &Feed, parsed: &ParsedFeed) -> IngestSummary {
    let mut summary = IngestSummary::default();

    for item in &parsed.items {
        match ingest_item(db, feed.id, item).await {
            Ok(IngestOutcome::Stored(post)) => {
                tracing::debug!(feed_id = feed.id, url = %post.url, "stored post");
                summary.stored += 1;
            }
            Ok(IngestOutcome::Skipped) => {
                summary.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(
                    feed_id = feed.id,
                    url = %item.link,
                    error = %e,
                    "failed to store post"
                );
                summary.failed += 1;
            }
        }
    }

    summary
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
