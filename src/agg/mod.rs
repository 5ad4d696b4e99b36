//! Feed aggregation: fetching, ingestion and the poll scheduler.
//!
//! The pipeline per cycle is Selector → mark-fetched → [`fetch_feed`] →
//! [`ingest_feed`], driven by [`Scheduler`] on a fixed interval. Failures
//! are isolated per feed and per item: a broken feed or a bad item is
//! logged and the loop keeps going.

mod fetcher;
mod ingest;
mod scheduler;

pub use fetcher::{fetch_feed, FetchError, ParsedFeed, ParsedItem};
pub use ingest::{ingest_feed, ingest_item, IngestOutcome, IngestSummary};
pub use scheduler::Scheduler;
