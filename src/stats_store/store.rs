//! SQLite-backed stats store: opening, schema checks and the write path.

use super::dedup::{self, NewRow};
use super::models::{StoreCounts, StoreStatus, TrackRef};
use super::resolver::{self, EntityKey};
use super::schema::STATS_VERSIONED_SCHEMAS;
use crate::error::{StatsError, StatsResult};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const COUNTED_TABLES: [&str; 9] = [
    "profiles",
    "artists",
    "tracks",
    "top_tracks",
    "scrobbles",
    "genres",
    "catalog_tracks",
    "places",
    "weather_observations",
];

#[derive(Clone)]
pub struct SqliteStatsStore {
    conn: Arc<Mutex<Connection>>,
}

/// Opens the file and sets up the connection. Failures here mean the store
/// cannot be reached at all.
fn open_connection(db_path: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
            | rusqlite::OpenFlags::SQLITE_OPEN_URI
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute("PRAGMA foreign_keys = ON;", [])?;
    Ok(conn)
}

/// Brings the schema of an open connection to the latest version, creating
/// it on an empty database.
fn prepare_schema(conn: &mut Connection, db_path: &Path) -> StatsResult<()> {
    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        let latest = STATS_VERSIONED_SCHEMAS
            .last()
            .context("No schemas defined")
            .map_err(StatsError::Schema)?;
        info!(
            "Creating stats db schema at version {} in {:?}",
            latest.version, db_path
        );
        return latest.create(conn).map_err(StatsError::Schema);
    }

    let db_version =
        conn.query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))?
            - BASE_DB_VERSION as i64;

    if db_version < 0 {
        return Err(StatsError::Schema(anyhow!(
            "Database {:?} was not created by this tool (user_version below {})",
            db_path,
            BASE_DB_VERSION
        )));
    }
    let version = db_version as usize;

    if version >= STATS_VERSIONED_SCHEMAS.len() {
        return Err(StatsError::Schema(anyhow!(
            "Stats database version {} is too new (max supported: {})",
            version,
            STATS_VERSIONED_SCHEMAS.len() - 1
        )));
    }

    STATS_VERSIONED_SCHEMAS[version]
        .validate(conn)
        .with_context(|| format!("Stats database does not match schema version {}", version))
        .map_err(StatsError::Schema)?;

    migrate_if_needed(conn, version).map_err(StatsError::Schema)
}

/// Runs every pending migration in a single transaction.
fn migrate_if_needed(conn: &mut Connection, current_version: usize) -> Result<()> {
    let target_version = STATS_VERSIONED_SCHEMAS.len() - 1;
    if current_version >= target_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in STATS_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating stats db from version {} to {}",
                schema.version - 1,
                schema.version
            );
            migration_fn(&tx)?;
        }
    }
    tx.pragma_update(None, "user_version", (BASE_DB_VERSION + target_version) as i64)?;
    tx.commit()?;
    Ok(())
}

impl SqliteStatsStore {
    /// Opens (or creates) the stats database at `db_path`.
    ///
    /// A new file gets the latest schema. An existing one is validated against
    /// the schema version it records, then migrated forward.
    pub fn new<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> StatsResult<Self> {
        let db_path = db_path.as_ref();
        let mut conn = open_connection(db_path, busy_timeout).inspect_err(|err| {
            warn!("Failed to open stats database at {:?}: {}", db_path, err)
        })?;
        prepare_schema(&mut conn, db_path)?;
        let store = SqliteStatsStore {
            conn: Arc::new(Mutex::new(conn)),
        };

        let counts = store.counts()?;
        info!(
            "Stats store ready: {} profiles, {} tracks, {} top track entries, {} scrobbles, {} catalog entries, {} weather days",
            counts.profiles,
            counts.tracks,
            counts.top_tracks,
            counts.scrobbles,
            counts.catalog_tracks,
            counts.weather_observations
        );
        Ok(store)
    }

    /// Create an in-memory store for testing.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        STATS_VERSIONED_SCHEMAS
            .last()
            .context("No schemas defined")?
            .create(&conn)?;
        Ok(SqliteStatsStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` inside an `IMMEDIATE` transaction.
    ///
    /// The write lock is taken before `f` runs, so a lookup followed by an
    /// insert cannot interleave with another writer. If `f` fails the
    /// transaction is rolled back.
    pub fn with_write_transaction<T, F>(&self, f: F) -> StatsResult<T>
    where
        F: FnOnce(&Transaction) -> StatsResult<T>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Returns the surrogate id for `key`, creating the entity on first sight.
    pub fn resolve(&self, key: &EntityKey) -> StatsResult<i64> {
        self.with_write_transaction(|tx| Ok(resolver::resolve(tx, key)?))
    }

    pub fn insert_if_absent(&self, row: &NewRow) -> StatsResult<bool> {
        self.with_write_transaction(|tx| Ok(dedup::insert_if_absent(tx, row)?))
    }

    /// Creates a profile with its location. An existing profile keeps the
    /// location it was first registered with.
    pub fn register_profile(
        &self,
        username: &str,
        city: Option<&str>,
        state: Option<&str>,
    ) -> StatsResult<i64> {
        self.with_write_transaction(|tx| {
            let created = tx.execute(
                "INSERT INTO profiles (username, city, state) VALUES (?1, ?2, ?3)
                 ON CONFLICT (username) DO NOTHING",
                params![username, city, state],
            )? == 1;
            if created {
                info!("Registered profile {}", username);
            } else {
                debug!("Profile {} already registered", username);
            }
            Ok(resolver::resolve(tx, &EntityKey::Subject(username))?)
        })
    }

    /// All usernames, grouped by location.
    pub fn list_usernames(&self) -> StatsResult<Vec<String>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare_cached("SELECT username FROM profiles ORDER BY state, city, username")?;
        let usernames = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(usernames)
    }

    pub fn find_profile_id(&self, username: &str) -> StatsResult<Option<i64>> {
        let conn = self.lock();
        Ok(resolver::lookup(&conn, &EntityKey::Subject(username))?)
    }

    /// Tracks with no storefront entry yet, oldest first.
    pub fn tracks_missing_catalog(&self, limit: usize) -> StatsResult<Vec<TrackRef>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT t.name, a.name
             FROM tracks t
             JOIN artists a ON a.id = t.artist_id
             WHERE NOT EXISTS (
                 SELECT 1 FROM catalog_tracks c
                 WHERE c.track_name = t.name AND c.artist_name = a.name
             )
             ORDER BY t.id
             LIMIT ?1",
        )?;
        let tracks = stmt
            .query_map(params![limit as i64], |row| {
                Ok(TrackRef {
                    name: row.get(0)?,
                    artist: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    pub fn status(&self) -> StatsResult<StoreStatus> {
        let counts = self.counts()?;
        let missing: i64 = self.lock().query_row(
            "SELECT COUNT(*)
             FROM tracks t
             JOIN artists a ON a.id = t.artist_id
             WHERE NOT EXISTS (
                 SELECT 1 FROM catalog_tracks c
                 WHERE c.track_name = t.name AND c.artist_name = a.name
             )",
            [],
            |r| r.get(0),
        )?;
        Ok(StoreStatus {
            counts,
            tracks_missing_catalog: missing as u64,
        })
    }

    pub fn counts(&self) -> StatsResult<StoreCounts> {
        let conn = self.lock();
        let mut values = [0u64; COUNTED_TABLES.len()];
        for (value, table) in values.iter_mut().zip(COUNTED_TABLES) {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            *value = count as u64;
        }
        let [profiles, artists, tracks, top_tracks, scrobbles, genres, catalog_tracks, places, weather_observations] =
            values;
        Ok(StoreCounts {
            profiles,
            artists,
            tracks,
            top_tracks,
            scrobbles,
            genres,
            catalog_tracks,
            places,
            weather_observations,
        })
    }

    /// Location of a profile, if registered with one.
    pub fn profile_location(
        &self,
        username: &str,
    ) -> StatsResult<Option<(Option<String>, Option<String>)>> {
        let conn = self.lock();
        Ok(conn
            .query_row(
                "SELECT city, state FROM profiles WHERE username = ?1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }
}
