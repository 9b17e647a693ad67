//! Scrobble Stats Library
//!
//! Idempotent ingestion of listening history, storefront catalog data and
//! daily weather into SQLite, plus the aggregate reports built on top.

pub mod config;
pub mod error;
pub mod ingest;
pub mod report;
pub mod sqlite_persistence;
pub mod stats_store;

// Re-export commonly used types for convenience
pub use error::{StatsError, StatsResult};
pub use ingest::{IngestOutcome, Ingestor, RecordExtractor};
pub use stats_store::{ListeningStatsStore, SqliteStatsStore};
