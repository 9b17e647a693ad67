//! Fixture payloads and store helpers

#![allow(dead_code)]

use super::constants::*;
use scrobble_stats::stats_store::{SqliteStatsStore, DEFAULT_BUSY_TIMEOUT};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

/// A store backed by a file in a temporary directory. The directory lives as
/// long as this value.
pub struct TestStore {
    pub store: SqliteStatsStore,
    pub db_path: PathBuf,
    pub dir: TempDir,
}

impl TestStore {
    /// Opens a second handle on the same database file.
    pub fn reopen(&self) -> SqliteStatsStore {
        SqliteStatsStore::new(&self.db_path, DEFAULT_BUSY_TIMEOUT).unwrap()
    }
}

pub fn open_store() -> TestStore {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("stats.db");
    let store = SqliteStatsStore::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap();
    TestStore {
        store,
        db_path,
        dir,
    }
}

/// `user.gettoptracks` response: three valid entries and one without artist.
pub fn top_tracks_payload() -> Value {
    json!({
        "toptracks": {
            "track": [
                {
                    "name": TRACK_1,
                    "playcount": "50",
                    "artist": {"name": ARTIST_A, "mbid": "", "url": "https://example.invalid/a"},
                    "@attr": {"rank": "1"}
                },
                {
                    "name": TRACK_2,
                    "playcount": "30",
                    "artist": {"name": ARTIST_A, "mbid": "", "url": "https://example.invalid/a"},
                    "@attr": {"rank": "2"}
                },
                {
                    "name": "Broken",
                    "playcount": "25",
                    "artist": {"mbid": ""},
                    "@attr": {"rank": "3"}
                },
                {
                    "name": TRACK_3,
                    "playcount": "20",
                    "artist": {"name": ARTIST_B, "mbid": "", "url": "https://example.invalid/b"},
                    "@attr": {"rank": "4"}
                }
            ],
            "@attr": {"user": ALICE, "page": "1", "perPage": "50", "totalPages": "1", "total": "4"}
        }
    })
}

/// `user.getrecenttracks` response: the first entry is playing now and has no date.
pub fn recent_tracks_payload() -> Value {
    json!({
        "recenttracks": {
            "track": [
                {
                    "name": TRACK_1,
                    "artist": {"#text": ARTIST_A},
                    "@attr": {"nowplaying": "true"}
                },
                {
                    "name": TRACK_1,
                    "artist": {"#text": ARTIST_A},
                    "date": {"uts": "1709417040", "#text": "02 Mar 2024, 22:04"}
                },
                {
                    "name": TRACK_2,
                    "artist": {"#text": ARTIST_A},
                    "date": {"uts": "1709416800", "#text": "02 Mar 2024, 22:00"}
                },
                {
                    "name": TRACK_1,
                    "artist": {"#text": ARTIST_A},
                    "date": {"uts": "1709413200", "#text": "02 Mar 2024, 21:00"}
                }
            ],
            "@attr": {"user": ALICE, "page": "1"}
        }
    })
}

/// Rows scraped from the library page.
pub fn scraped_scrobble_rows(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "track": format!("Scraped {}", i),
                "artist": ARTIST_B,
                "timestamp": format!("2 Mar 2024, {:02}:{:02}", i / 60, i % 60)
            })
        })
        .collect()
}

/// Storefront search response for TRACK_1 by ARTIST_A. The first result is a
/// different recording, the second one matches.
pub fn catalog_search_payload() -> Value {
    json!({
        "resultCount": 2,
        "results": [
            {
                "wrapperType": "track",
                "trackName": "Something Else",
                "artistName": "Cover Band",
                "primaryGenreName": "Pop",
                "releaseDate": "2010-01-01T08:00:00Z"
            },
            {
                "wrapperType": "track",
                "trackName": "Track 1 (Remastered)",
                "artistName": ARTIST_A,
                "collectionName": "Greatest",
                "primaryGenreName": "Rock",
                "releaseDate": "2019-05-03T07:00:00Z",
                "trackTimeMillis": 215000,
                "trackPrice": 1.29,
                "collectionPrice": 9.99,
                "country": "USA"
            }
        ]
    })
}

/// Archive response with four days of data.
pub fn weather_archive_payload() -> Value {
    json!({
        "latitude": 42.28,
        "longitude": -83.74,
        "timezone": "America/Detroit",
        "daily_units": {
            "time": "iso8601",
            "temperature_2m_max": "°C",
            "temperature_2m_min": "°C",
            "precipitation_sum": "mm",
            "rain_sum": "mm",
            "snowfall_sum": "cm"
        },
        "daily": {
            "time": ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
            "temperature_2m_max": [0.0, 10.0, 20.0, 30.0],
            "temperature_2m_min": [-10.0, -5.0, 0.0, 5.0],
            "precipitation_sum": [1.0, 2.0, 3.0, 4.0],
            "rain_sum": [0.5, 2.0, 3.0, 4.0],
            "snowfall_sum": [2.0, 0.0, 0.0, 0.0]
        }
    })
}
