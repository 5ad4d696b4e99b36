use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::storage::{Database, StorageError};

use super::fetcher::fetch_feed;
use super::ingest::ingest_feed;

/// Drives the poll loop: every tick, pick the most overdue feed, mark it
/// fetched and ingest its items.
///
/// One feed per tick, ticks strictly sequential. A cycle that fails never
/// stops the loop; only the shutdown signal does.
pub struct Scheduler {
    db: Database,
    client: reqwest::Client,
    interval: Duration,
}

impl Scheduler {
    pub fn new(db: Database, client: reqwest::Client, interval: Duration) -> Self {
        Self {
            db,
            client,
            interval,
        }
    }

    /// Run until the shutdown signal fires. The first cycle starts
    /// immediately; if a cycle overruns the interval, missed ticks are
    /// skipped rather than bursted.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.scrape_once().await {
                        tracing::warn!(error = %e, "poll cycle failed");
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// One poll cycle over the least-recently-fetched feed.
    ///
    /// The feed is marked fetched *before* the download: a feed that
    /// keeps failing still counts as visited for this round and cannot
    /// starve the others by being re-selected every tick. Fetch errors
    /// are logged and end the cycle without propagating.
    pub async fn scrape_once(&self) -> Result<(), StorageError> {
        let feed = match self.db.next_feed_to_fetch().await {
            Ok(feed) => feed,
            Err(StorageError::NotFound) => {
                tracing::info!("no feeds registered, nothing to fetch");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.db
            .mark_feed_fetched(feed.id, chrono::Utc::now().timestamp())
            .await?;

        let parsed = match fetch_feed(&self.client, &feed.url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(feed_id = feed.id, url = %feed.url, error = %e, "failed to fetch feed");
                return Ok(());
            }
        };

        let summary = ingest_feed(&self.db, &feed, &parsed).await;
        tracing::info!(
            feed_id = feed.id,
            url = %feed.url,
            stored = summary.stored,
            skipped = summary.skipped,
            failed = summary.failed,
            "poll cycle complete"
        );

        Ok(())
    }
}
