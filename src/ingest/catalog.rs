//! Storefront search results.

use super::extractor::{
    integer_field, number_field, required_text, text_field, MalformedRecord, RecordExtractor,
    SourceRecord,
};
use crate::stats_store::{CatalogEntry, TrackRef};
use serde_json::Value;

pub const UNKNOWN_GENRE: &str = "Unknown";

/// Maps a storefront search result onto a catalog entry.
///
/// With a query set, the entry is stored under the queried names instead of the
/// storefront's spelling, so the track it was looked up for stops showing as
/// missing and joins against the listening tables.
#[derive(Debug, Clone, Default)]
pub struct CatalogExtractor {
    pub query: Option<TrackRef>,
}

impl CatalogExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_query(query: TrackRef) -> Self {
        CatalogExtractor { query: Some(query) }
    }
}

/// Leading year of dates like `2019-05-03T07:00:00Z`.
fn release_year(release_date: &str) -> Option<i32> {
    let year = release_date.split('-').next()?;
    if year.len() != 4 {
        return None;
    }
    year.parse().ok()
}

impl RecordExtractor for CatalogExtractor {
    fn source(&self) -> &'static str {
        "catalog"
    }

    fn extract(&self, raw: &Value) -> Result<SourceRecord, MalformedRecord> {
        let found_track = required_text(raw, "trackName")?;
        let found_artist = required_text(raw, "artistName")?;
        let (track_name, artist_name) = match &self.query {
            Some(query) => (query.name.clone(), query.artist.clone()),
            None => (found_track, found_artist),
        };

        let release_date = text_field(raw, "releaseDate");
        let release_year = release_date.as_deref().and_then(release_year);

        Ok(SourceRecord::Catalog(CatalogEntry {
            track_name,
            artist_name,
            collection_name: text_field(raw, "collectionName"),
            genre: text_field(raw, "primaryGenreName").unwrap_or_else(|| UNKNOWN_GENRE.to_string()),
            release_date,
            release_year,
            duration_ms: integer_field(raw, "trackTimeMillis")?,
            track_price: number_field(raw, "trackPrice")?,
            collection_price: number_field(raw, "collectionPrice")?,
            country: text_field(raw, "country"),
        }))
    }
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// Picks the search result that best matches the queried track.
///
/// The first result whose track and artist names contain the queried ones
/// (case-insensitive) wins; otherwise the first result is used.
pub fn pick_catalog_match<'a>(track: &str, artist: &str, results: &'a [Value]) -> Option<&'a Value> {
    results
        .iter()
        .find(|result| {
            contains_ignore_case(result.get("trackName").and_then(Value::as_str), track)
                && contains_ignore_case(result.get("artistName").and_then(Value::as_str), artist)
        })
        .or_else(|| results.first())
}
