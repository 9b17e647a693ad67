use chrono::NaiveDate;
use serde::Serialize;

// ============================================================================
// Ingestion-side records
// ============================================================================

/// A track as referenced by an external record: its title plus the artist's name.
/// Track titles are only unique within an artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub name: String,
    pub artist: String,
}

/// Storefront metadata for one (track, artist) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub track_name: String,
    pub artist_name: String,
    pub collection_name: Option<String>,
    pub genre: String,
    pub release_date: Option<String>,
    pub release_year: Option<i32>,
    pub duration_ms: Option<i64>,
    pub track_price: Option<f64>,
    pub collection_price: Option<f64>,
    pub country: Option<String>,
}

/// One day of archived weather for a place.
/// Temperatures in Celsius, precipitation in mm, snowfall in cm.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDay {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation: f64,
    pub snowfall: f64,
}

/// Row counts per table, mostly useful to check dedup behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub profiles: u64,
    pub artists: u64,
    pub tracks: u64,
    pub top_tracks: u64,
    pub scrobbles: u64,
    pub genres: u64,
    pub catalog_tracks: u64,
    pub places: u64,
    pub weather_observations: u64,
}

/// Table counts plus the size of the storefront lookup backlog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    #[serde(flatten)]
    pub counts: StoreCounts,
    pub tracks_missing_catalog: u64,
}

// ============================================================================
// Aggregation results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaycountAverage {
    pub average: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistPlaycount {
    pub artist: String,
    pub total_playcount: u64,
    pub num_tracks_in_top: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackPlaycount {
    pub track: String,
    pub artist: String,
    pub playcount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenrePlaycount {
    pub genre: String,
    pub total_playcount: u64,
    pub num_tracks_in_top: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrobbleSummary {
    pub scrobbles: u64,
    pub distinct_tracks: u64,
}

/// Means over the weather observations of a date range, in storage units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherAverages {
    pub days: u64,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation: f64,
    pub snowfall: f64,
}
