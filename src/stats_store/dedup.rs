//! Insert-if-absent for the composite-keyed fact tables.

use super::models::{CatalogEntry, WeatherDay};
use rusqlite::{params, Connection};

/// A fact row whose parent ids are already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum NewRow<'a> {
    TopTrack {
        profile_id: i64,
        period: &'a str,
        track_id: i64,
        playcount: i64,
    },
    Scrobble {
        profile_id: i64,
        track_id: i64,
        scrobbled_at: &'a str,
    },
    Catalog {
        genre_id: i64,
        entry: &'a CatalogEntry,
    },
    Weather {
        place_id: i64,
        day: &'a WeatherDay,
    },
}

impl NewRow<'_> {
    pub fn table(&self) -> &'static str {
        match self {
            NewRow::TopTrack { .. } => "top_tracks",
            NewRow::Scrobble { .. } => "scrobbles",
            NewRow::Catalog { .. } => "catalog_tracks",
            NewRow::Weather { .. } => "weather_observations",
        }
    }
}

/// Inserts `row` unless a row with the same natural key exists.
///
/// Returns `true` iff a row was created. An existing row is never updated.
/// Only the natural-key conflict is absorbed; NOT NULL and foreign key
/// violations are returned as errors.
pub fn insert_if_absent(conn: &Connection, row: &NewRow) -> rusqlite::Result<bool> {
    let changed = match row {
        NewRow::TopTrack {
            profile_id,
            period,
            track_id,
            playcount,
        } => conn.execute(
            "INSERT INTO top_tracks (profile_id, period, track_id, playcount)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (profile_id, period, track_id) DO NOTHING",
            params![profile_id, period, track_id, playcount],
        )?,
        NewRow::Scrobble {
            profile_id,
            track_id,
            scrobbled_at,
        } => conn.execute(
            "INSERT INTO scrobbles (profile_id, track_id, scrobbled_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (profile_id, track_id, scrobbled_at) DO NOTHING",
            params![profile_id, track_id, scrobbled_at],
        )?,
        NewRow::Catalog { genre_id, entry } => conn.execute(
            "INSERT INTO catalog_tracks
             (track_name, artist_name, collection_name, genre_id, release_date, release_year,
              duration_ms, track_price, collection_price, country)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (track_name, artist_name) DO NOTHING",
            params![
                entry.track_name,
                entry.artist_name,
                entry.collection_name,
                genre_id,
                entry.release_date,
                entry.release_year,
                entry.duration_ms,
                entry.track_price,
                entry.collection_price,
                entry.country,
            ],
        )?,
        NewRow::Weather { place_id, day } => conn.execute(
            "INSERT INTO weather_observations
             (place_id, date, temperature_max, temperature_min, precipitation, snowfall)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (place_id, date) DO NOTHING",
            params![
                place_id,
                day.date.format("%Y-%m-%d").to_string(),
                day.temperature_max,
                day.temperature_min,
                day.precipitation,
                day.snowfall,
            ],
        )?,
    };
    Ok(changed == 1)
}
