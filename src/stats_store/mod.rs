mod dedup;
mod models;
mod queries;
mod resolver;
mod schema;
mod store;
mod trait_def;

pub use dedup::{insert_if_absent, NewRow};
pub use models::{
    ArtistPlaycount, CatalogEntry, GenrePlaycount, PlaycountAverage, ScrobbleSummary,
    StoreCounts, StoreStatus, TrackPlaycount, TrackRef, WeatherAverages, WeatherDay,
};
pub use resolver::{lookup, resolve, EntityKey};
pub use schema::STATS_VERSIONED_SCHEMAS;
pub use store::{SqliteStatsStore, DEFAULT_BUSY_TIMEOUT};
pub use trait_def::ListeningStatsStore;
