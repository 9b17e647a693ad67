//! SQLite schema definitions for the stats database.
//!
//! Every table has an integer surrogate key (`id`) and a UNIQUE constraint on its
//! natural key. Version 0 holds the listening tables; version 1 adds the
//! storefront catalog and the weather archive.

use crate::sqlite_column;
use crate::sqlite_persistence::{ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema};
use anyhow::Result;
use rusqlite::Connection;

const PROFILES_FK: ForeignKey = ForeignKey {
    foreign_table: "profiles",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const ARTISTS_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const TRACKS_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const GENRES_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const PLACES_FK: ForeignKey = ForeignKey {
    foreign_table: "places",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

// =============================================================================
// Listening tables (v0)
// =============================================================================

/// Tracked subjects (scrobbling service users).
const PROFILES_TABLE: Table = Table {
    name: "profiles",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("username", SqlType::Text, non_null = true),
        sqlite_column!("city", SqlType::Text),
        sqlite_column!("state", SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[&["username"]],
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

/// A track name is only unique within its artist.
const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTISTS_FK)
        ),
    ],
    indices: &[("idx_tracks_artist", "artist_id")],
    unique_constraints: &[&["name", "artist_id"]],
};

const TOP_TRACKS_TABLE: Table = Table {
    name: "top_tracks",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "profile_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PROFILES_FK)
        ),
        sqlite_column!("period", SqlType::Text, non_null = true), // '7day', '1month', 'overall'...
        sqlite_column!(
            "track_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACKS_FK)
        ),
        sqlite_column!("playcount", SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_top_tracks_track", "track_id")],
    unique_constraints: &[&["profile_id", "period", "track_id"]],
};

const SCROBBLES_TABLE: Table = Table {
    name: "scrobbles",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "profile_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PROFILES_FK)
        ),
        sqlite_column!(
            "track_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACKS_FK)
        ),
        sqlite_column!("scrobbled_at", SqlType::Text, non_null = true),
    ],
    indices: &[("idx_scrobbles_track", "track_id")],
    unique_constraints: &[&["profile_id", "track_id", "scrobbled_at"]],
};

// =============================================================================
// Catalog and weather tables (v1)
// =============================================================================

const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

/// Storefront metadata, keyed by names rather than by track id so that it can be
/// filled in independently of the listening tables.
const CATALOG_TRACKS_TABLE: Table = Table {
    name: "catalog_tracks",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("track_name", SqlType::Text, non_null = true),
        sqlite_column!("artist_name", SqlType::Text, non_null = true),
        sqlite_column!("collection_name", SqlType::Text),
        sqlite_column!(
            "genre_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&GENRES_FK)
        ),
        sqlite_column!("release_date", SqlType::Text),
        sqlite_column!("release_year", SqlType::Integer),
        sqlite_column!("duration_ms", SqlType::Integer),
        sqlite_column!("track_price", SqlType::Real),
        sqlite_column!("collection_price", SqlType::Real),
        sqlite_column!("country", SqlType::Text),
    ],
    indices: &[("idx_catalog_tracks_genre", "genre_id")],
    unique_constraints: &[&["track_name", "artist_name"]],
};

const PLACES_TABLE: Table = Table {
    name: "places",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

const WEATHER_OBSERVATIONS_TABLE: Table = Table {
    name: "weather_observations",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "place_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLACES_FK)
        ),
        sqlite_column!("date", SqlType::Text, non_null = true), // 'YYYY-MM-DD'
        sqlite_column!("temperature_max", SqlType::Real, non_null = true),
        sqlite_column!("temperature_min", SqlType::Real, non_null = true),
        sqlite_column!("precipitation", SqlType::Real, non_null = true),
        sqlite_column!("snowfall", SqlType::Real, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["place_id", "date"]],
};

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    for table in [
        &GENRES_TABLE,
        &CATALOG_TRACKS_TABLE,
        &PLACES_TABLE,
        &WEATHER_OBSERVATIONS_TABLE,
    ] {
        table.create(conn)?;
    }
    Ok(())
}

pub const STATS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            PROFILES_TABLE,
            ARTISTS_TABLE,
            TRACKS_TABLE,
            TOP_TRACKS_TABLE,
            SCROBBLES_TABLE,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            PROFILES_TABLE,
            ARTISTS_TABLE,
            TRACKS_TABLE,
            TOP_TRACKS_TABLE,
            SCROBBLES_TABLE,
            GENRES_TABLE,
            CATALOG_TRACKS_TABLE,
            PLACES_TABLE,
            WEATHER_OBSERVATIONS_TABLE,
        ],
        migration: Some(migrate_v0_to_v1),
    },
];
