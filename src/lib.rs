//! Personal RSS aggregation: a follow graph over users and feeds, a fair
//! poll scheduler and an idempotent post ingestion pipeline.
//!
//! The [`storage`] module is the gateway to the SQLite database, [`agg`]
//! holds the fetch/ingest/schedule pipeline and [`ops`] exposes one entry
//! point per CLI command. The binary in `main.rs` only parses arguments and
//! formats results.

pub mod agg;
pub mod config;
pub mod ops;
pub mod storage;
