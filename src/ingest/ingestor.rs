//! Budgeted batch ingestion.

use super::extractor::{RecordExtractor, SourceRecord};
use crate::error::StatsResult;
use crate::stats_store::{insert_if_absent, resolve, EntityKey, NewRow, SqliteStatsStore};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Counts for one batch. `considered` covers every record examined, whatever
/// happened to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub inserted: usize,
    pub considered: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

/// Resolves the record's parents and inserts its row. Runs inside the
/// caller's transaction.
fn write_record(conn: &Connection, record: &SourceRecord) -> rusqlite::Result<bool> {
    let row_track_id = |username: &str, name: &str, artist: &str| -> rusqlite::Result<(i64, i64)> {
        let profile_id = resolve(conn, &EntityKey::Subject(username))?;
        let artist_id = resolve(conn, &EntityKey::Artist(artist))?;
        let track_id = resolve(conn, &EntityKey::Track { name, artist_id })?;
        Ok((profile_id, track_id))
    };

    match record {
        SourceRecord::TopTrack {
            username,
            period,
            track,
            playcount,
        } => {
            let (profile_id, track_id) = row_track_id(username, &track.name, &track.artist)?;
            insert_if_absent(
                conn,
                &NewRow::TopTrack {
                    profile_id,
                    period,
                    track_id,
                    playcount: *playcount,
                },
            )
        }
        SourceRecord::Scrobble {
            username,
            track,
            scrobbled_at,
        } => {
            let (profile_id, track_id) = row_track_id(username, &track.name, &track.artist)?;
            insert_if_absent(
                conn,
                &NewRow::Scrobble {
                    profile_id,
                    track_id,
                    scrobbled_at,
                },
            )
        }
        SourceRecord::Catalog(entry) => {
            let genre_id = resolve(conn, &EntityKey::Genre(&entry.genre))?;
            insert_if_absent(conn, &NewRow::Catalog { genre_id, entry })
        }
        SourceRecord::Weather { place, day } => {
            let place_id = resolve(conn, &EntityKey::Place(place))?;
            insert_if_absent(conn, &NewRow::Weather { place_id, day })
        }
    }
}

/// Drives one extractor over a page of records against the store.
pub struct Ingestor<E: RecordExtractor> {
    store: SqliteStatsStore,
    extractor: E,
}

impl<E: RecordExtractor> Ingestor<E> {
    pub fn new(store: SqliteStatsStore, extractor: E) -> Self {
        Ingestor { store, extractor }
    }

    /// Ingests `records` in order until `budget` new rows have been inserted.
    ///
    /// Malformed records and duplicates do not count against the budget. Each
    /// record is committed on its own, so a store failure keeps whatever was
    /// committed before it and rolls back the failing record only.
    pub fn ingest<'r, I>(&self, records: I, budget: usize) -> StatsResult<IngestOutcome>
    where
        I: IntoIterator<Item = &'r Value>,
    {
        let source = self.extractor.source();
        let mut outcome = IngestOutcome::default();

        if budget == 0 {
            info!("[{}] Budget is 0, nothing to ingest", source);
            return Ok(outcome);
        }

        for raw in records {
            outcome.considered += 1;

            let record = match self.extractor.extract(raw) {
                Ok(record) => record,
                Err(e) => {
                    debug!("[{}] Skipping record #{}: {}", source, outcome.considered, e);
                    outcome.malformed += 1;
                    continue;
                }
            };

            let inserted = self
                .store
                .with_write_transaction(|tx| Ok(write_record(tx, &record)?))
                .inspect_err(|e| {
                    warn!(
                        "[{}] Aborting batch at record #{}: {}",
                        source, outcome.considered, e
                    )
                })?;

            if inserted {
                outcome.inserted += 1;
                if outcome.inserted == budget {
                    debug!("[{}] Row budget of {} reached", source, budget);
                    break;
                }
            } else {
                debug!(
                    "[{}] Record #{} already stored",
                    source, outcome.considered
                );
                outcome.duplicates += 1;
            }
        }

        info!(
            "[{}] Ingested {} new rows ({} considered, {} duplicates, {} malformed)",
            source, outcome.inserted, outcome.considered, outcome.duplicates, outcome.malformed
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{CatalogExtractor, RecentScrobblesExtractor, TopTracksExtractor};
    use crate::stats_store::ListeningStatsStore;
    use serde_json::json;

    fn top_tracks_page() -> Vec<Value> {
        vec![
            json!({"name": "Track 1", "artist": {"name": "A"}, "playcount": "50"}),
            json!({"name": "Track 2", "artist": {"name": "A"}, "playcount": "30"}),
            json!({"name": "Track 3", "artist": {"name": "B"}, "playcount": "20"}),
        ]
    }

    fn top_tracks_ingestor(store: &SqliteStatsStore) -> Ingestor<TopTracksExtractor> {
        Ingestor::new(store.clone(), TopTracksExtractor::new("alice", "7day"))
    }

    #[test]
    fn ingests_full_page_within_budget() {
        let store = SqliteStatsStore::in_memory().unwrap();
        let outcome = top_tracks_ingestor(&store)
            .ingest(&top_tracks_page(), 25)
            .unwrap();

        assert_eq!(
            outcome,
            IngestOutcome {
                inserted: 3,
                considered: 3,
                duplicates: 0,
                malformed: 0
            }
        );
        let counts = store.counts().unwrap();
        assert_eq!(counts.profiles, 1);
        assert_eq!(counts.artists, 2);
        assert_eq!(counts.tracks, 3);
        assert_eq!(counts.top_tracks, 3);
    }

    #[test]
    fn stops_when_budget_is_reached() {
        let store = SqliteStatsStore::in_memory().unwrap();
        let outcome = top_tracks_ingestor(&store)
            .ingest(&top_tracks_page(), 2)
            .unwrap();

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.considered, 2);
        // the third record was never consumed, so its artist does not exist
        assert_eq!(store.counts().unwrap().artists, 1);
    }

    #[test]
    fn zero_budget_consumes_nothing() {
        let store = SqliteStatsStore::in_memory().unwrap();
        let outcome = top_tracks_ingestor(&store)
            .ingest(&top_tracks_page(), 0)
            .unwrap();

        assert_eq!(outcome, IngestOutcome::default());
        assert_eq!(store.counts().unwrap().profiles, 0);
    }

    #[test]
    fn malformed_records_are_skipped_and_do_not_use_budget() {
        let store = SqliteStatsStore::in_memory().unwrap();
        let page = vec![
            json!({"name": "", "artist": "A"}),
            json!({"name": "Track 1", "artist": "A", "playcount": 50}),
            json!({"artist": "B"}),
            json!({"name": "Track 2", "artist": "A", "playcount": 30}),
        ];
        let outcome = top_tracks_ingestor(&store).ingest(&page, 2).unwrap();

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.malformed, 2);
        assert_eq!(outcome.considered, 4);
    }

    #[test]
    fn rerun_only_counts_duplicates() {
        let store = SqliteStatsStore::in_memory().unwrap();
        let ingestor = top_tracks_ingestor(&store);
        ingestor.ingest(&top_tracks_page(), 25).unwrap();

        let second = ingestor.ingest(&top_tracks_page(), 25).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(store.counts().unwrap().top_tracks, 3);
    }

    #[test]
    fn duplicates_within_a_page_keep_first_playcount() {
        let store = SqliteStatsStore::in_memory().unwrap();
        let page = vec![
            json!({"name": "Track 1", "artist": "A", "playcount": 50}),
            json!({"name": "Track 1", "artist": "A", "playcount": 7}),
        ];
        let outcome = top_tracks_ingestor(&store).ingest(&page, 25).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.duplicates, 1);

        let tracks = store.top_tracks("alice", "7day", 10).unwrap();
        assert_eq!(tracks[0].playcount, 50);
    }

    #[test]
    fn scrobbles_share_tracks_with_top_tracks() {
        let store = SqliteStatsStore::in_memory().unwrap();
        top_tracks_ingestor(&store)
            .ingest(&top_tracks_page(), 25)
            .unwrap();

        let scrobbles = vec![
            json!({"track": "Track 1", "artist": "A", "timestamp": "2024-03-01 10:00"}),
            json!({"track": "Track 1", "artist": "A", "timestamp": "2024-03-01 10:04"}),
            json!({"track": "Track 1", "artist": "A"}),
        ];
        let outcome = Ingestor::new(store.clone(), RecentScrobblesExtractor::new("alice"))
            .ingest(&scrobbles, 25)
            .unwrap();

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.malformed, 1);
        let counts = store.counts().unwrap();
        assert_eq!(counts.tracks, 3);
        assert_eq!(counts.scrobbles, 2);
    }

    #[test]
    fn catalog_entries_create_genres() {
        let store = SqliteStatsStore::in_memory().unwrap();
        let results = vec![
            json!({"trackName": "Track 1", "artistName": "A", "primaryGenreName": "Rock"}),
            json!({"trackName": "Track 2", "artistName": "A"}),
        ];
        let outcome = Ingestor::new(store.clone(), CatalogExtractor::new())
            .ingest(&results, 25)
            .unwrap();

        assert_eq!(outcome.inserted, 2);
        let counts = store.counts().unwrap();
        assert_eq!(counts.genres, 2);
        assert_eq!(counts.catalog_tracks, 2);
    }
}
