mod catalog;
mod extractor;
mod ingestor;
mod lastfm;
mod plan;
mod weather;

pub use catalog::{pick_catalog_match, CatalogExtractor, UNKNOWN_GENRE};
pub use extractor::{unwrap_records, MalformedRecord, RecordExtractor, SourceRecord};
pub use ingestor::{IngestOutcome, Ingestor};
pub use lastfm::{
    canonical_scrobble_time, RecentScrobblesExtractor, TopTracksExtractor, SCROBBLE_TIME_FORMAT,
};
pub use plan::{collect_listening, split_budget, ListeningRunSummary, DEFAULT_MAX_NEW_ROWS};
pub use weather::{daily_records, WeatherExtractor};
