//! Natural key to surrogate id resolution.
//!
//! Every function here takes a plain `&Connection` so it can run inside the
//! caller's write transaction (`Transaction` derefs to `Connection`).

use rusqlite::{params, Connection, OptionalExtension};

/// Natural key of an entity that is created on first reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKey<'a> {
    Artist(&'a str),
    Genre(&'a str),
    Place(&'a str),
    Subject(&'a str),
    /// Track titles are scoped to their artist.
    Track { name: &'a str, artist_id: i64 },
}

impl EntityKey<'_> {
    fn table(&self) -> &'static str {
        match self {
            EntityKey::Artist(_) => "artists",
            EntityKey::Genre(_) => "genres",
            EntityKey::Place(_) => "places",
            EntityKey::Subject(_) => "profiles",
            EntityKey::Track { .. } => "tracks",
        }
    }

    fn name_column(&self) -> &'static str {
        match self {
            EntityKey::Subject(_) => "username",
            _ => "name",
        }
    }
}

/// Returns the id for `key`, inserting the row if it does not exist yet.
///
/// The insert absorbs the uniqueness conflict, so calling this twice for the
/// same key yields the same id and leaves a single row.
pub fn resolve(conn: &Connection, key: &EntityKey) -> rusqlite::Result<i64> {
    match key {
        EntityKey::Track { name, artist_id } => {
            conn.execute(
                "INSERT INTO tracks (name, artist_id) VALUES (?1, ?2)
                 ON CONFLICT (name, artist_id) DO NOTHING",
                params![name, artist_id],
            )?;
        }
        EntityKey::Artist(name)
        | EntityKey::Genre(name)
        | EntityKey::Place(name)
        | EntityKey::Subject(name) => {
            conn.execute(
                &format!(
                    "INSERT INTO {table} ({column}) VALUES (?1) ON CONFLICT ({column}) DO NOTHING",
                    table = key.table(),
                    column = key.name_column()
                ),
                params![name],
            )?;
        }
    }

    lookup(conn, key)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Read-only counterpart of [`resolve`].
pub fn lookup(conn: &Connection, key: &EntityKey) -> rusqlite::Result<Option<i64>> {
    match key {
        EntityKey::Track { name, artist_id } => conn
            .query_row(
                "SELECT id FROM tracks WHERE name = ?1 AND artist_id = ?2",
                params![name, artist_id],
                |row| row.get(0),
            )
            .optional(),
        EntityKey::Artist(name)
        | EntityKey::Genre(name)
        | EntityKey::Place(name)
        | EntityKey::Subject(name) => conn
            .query_row(
                &format!(
                    "SELECT id FROM {} WHERE {} = ?1",
                    key.table(),
                    key.name_column()
                ),
                params![name],
                |row| row.get(0),
            )
            .optional(),
    }
}
