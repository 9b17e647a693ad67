//! SQLite implementation of the aggregation queries.

use super::models::{
    ArtistPlaycount, GenrePlaycount, PlaycountAverage, ScrobbleSummary, TrackPlaycount,
    WeatherAverages,
};
use super::resolver::{lookup, EntityKey};
use super::store::SqliteStatsStore;
use super::trait_def::ListeningStatsStore;
use crate::error::{StatsError, StatsResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

// SQLite integers are signed; counts and sums of non-negative playcounts never are.
fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn require_subject(conn: &Connection, username: &str) -> StatsResult<i64> {
    lookup(conn, &EntityKey::Subject(username))?
        .ok_or_else(|| StatsError::subject_not_found(username))
}

fn require_place(conn: &Connection, place: &str) -> StatsResult<i64> {
    lookup(conn, &EntityKey::Place(place))?.ok_or_else(|| StatsError::place_not_found(place))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl ListeningStatsStore for SqliteStatsStore {
    fn average_playcount(&self, username: &str, period: &str) -> StatsResult<PlaycountAverage> {
        let conn = self.lock();
        let profile_id = require_subject(&conn, username)?;
        let (average, count): (Option<f64>, i64) = conn.query_row(
            "SELECT AVG(playcount), COUNT(*) FROM top_tracks
             WHERE profile_id = ?1 AND period = ?2",
            params![profile_id, period],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(PlaycountAverage {
            average: average.unwrap_or(0.0),
            count: to_count(count),
        })
    }

    fn top_artists(
        &self,
        username: &str,
        period: &str,
        limit: usize,
    ) -> StatsResult<Vec<ArtistPlaycount>> {
        let conn = self.lock();
        let profile_id = require_subject(&conn, username)?;
        let mut stmt = conn.prepare_cached(
            "SELECT a.name, SUM(tt.playcount) AS total, COUNT(tt.id)
             FROM top_tracks tt
             JOIN tracks t ON t.id = tt.track_id
             JOIN artists a ON a.id = t.artist_id
             WHERE tt.profile_id = ?1 AND tt.period = ?2
             GROUP BY a.id
             ORDER BY total DESC, a.id ASC
             LIMIT ?3",
        )?;
        let artists = stmt
            .query_map(params![profile_id, period, limit as i64], |row| {
                Ok(ArtistPlaycount {
                    artist: row.get(0)?,
                    total_playcount: to_count(row.get(1)?),
                    num_tracks_in_top: to_count(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn top_tracks(
        &self,
        username: &str,
        period: &str,
        limit: usize,
    ) -> StatsResult<Vec<TrackPlaycount>> {
        let conn = self.lock();
        let profile_id = require_subject(&conn, username)?;
        let mut stmt = conn.prepare_cached(
            "SELECT t.name, a.name, tt.playcount
             FROM top_tracks tt
             JOIN tracks t ON t.id = tt.track_id
             JOIN artists a ON a.id = t.artist_id
             WHERE tt.profile_id = ?1 AND tt.period = ?2
             ORDER BY tt.playcount DESC, tt.id ASC
             LIMIT ?3",
        )?;
        let tracks = stmt
            .query_map(params![profile_id, period, limit as i64], |row| {
                Ok(TrackPlaycount {
                    track: row.get(0)?,
                    artist: row.get(1)?,
                    playcount: to_count(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn top_genres(
        &self,
        username: &str,
        period: &str,
        limit: usize,
    ) -> StatsResult<Vec<GenrePlaycount>> {
        let conn = self.lock();
        let profile_id = require_subject(&conn, username)?;
        // Catalog rows are keyed by names, so the join goes through the artist name.
        let mut stmt = conn.prepare_cached(
            "SELECT g.name, SUM(tt.playcount) AS total, COUNT(tt.id)
             FROM top_tracks tt
             JOIN tracks t ON t.id = tt.track_id
             JOIN artists a ON a.id = t.artist_id
             JOIN catalog_tracks c ON c.track_name = t.name AND c.artist_name = a.name
             JOIN genres g ON g.id = c.genre_id
             WHERE tt.profile_id = ?1 AND tt.period = ?2
             GROUP BY g.id
             ORDER BY total DESC, g.id ASC
             LIMIT ?3",
        )?;
        let genres = stmt
            .query_map(params![profile_id, period, limit as i64], |row| {
                Ok(GenrePlaycount {
                    genre: row.get(0)?,
                    total_playcount: to_count(row.get(1)?),
                    num_tracks_in_top: to_count(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    fn scrobble_summary(&self, username: &str) -> StatsResult<ScrobbleSummary> {
        let conn = self.lock();
        let profile_id = require_subject(&conn, username)?;
        let (scrobbles, distinct_tracks): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT track_id) FROM scrobbles WHERE profile_id = ?1",
            params![profile_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(ScrobbleSummary {
            scrobbles: to_count(scrobbles),
            distinct_tracks: to_count(distinct_tracks),
        })
    }

    fn weather_averages(
        &self,
        place: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StatsResult<Option<WeatherAverages>> {
        let conn = self.lock();
        let place_id = require_place(&conn, place)?;
        if start > end {
            return Ok(None);
        }

        let (days, temperature_max, temperature_min, precipitation, snowfall): (
            i64,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
        ) = conn.query_row(
            "SELECT COUNT(*), AVG(temperature_max), AVG(temperature_min),
                    AVG(precipitation), AVG(snowfall)
             FROM weather_observations
             WHERE place_id = ?1 AND date BETWEEN ?2 AND ?3",
            params![place_id, format_date(start), format_date(end)],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )?;

        if days == 0 {
            return Ok(None);
        }
        Ok(Some(WeatherAverages {
            days: to_count(days),
            temperature_max: temperature_max.unwrap_or_default(),
            temperature_min: temperature_min.unwrap_or_default(),
            precipitation: precipitation.unwrap_or_default(),
            snowfall: snowfall.unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats_store::dedup::{self, NewRow};
    use crate::stats_store::resolver;
    use crate::stats_store::models::{CatalogEntry, WeatherDay};

    fn add_top_track(
        store: &SqliteStatsStore,
        username: &str,
        period: &str,
        artist: &str,
        track: &str,
        playcount: i64,
    ) {
        store
            .with_write_transaction(|tx| {
                let profile_id = resolver::resolve(tx, &EntityKey::Subject(username))?;
                let artist_id = resolver::resolve(tx, &EntityKey::Artist(artist))?;
                let track_id = resolver::resolve(
                    tx,
                    &EntityKey::Track {
                        name: track,
                        artist_id,
                    },
                )?;
                dedup::insert_if_absent(
                    tx,
                    &NewRow::TopTrack {
                        profile_id,
                        period,
                        track_id,
                        playcount,
                    },
                )?;
                Ok(())
            })
            .unwrap();
    }

    /// alice/7day: A has "Track 1" (50) and "Track 2" (30), B has "Track 3" (20).
    fn alice_store() -> SqliteStatsStore {
        let store = SqliteStatsStore::in_memory().unwrap();
        add_top_track(&store, "alice", "7day", "A", "Track 1", 50);
        add_top_track(&store, "alice", "7day", "A", "Track 2", 30);
        add_top_track(&store, "alice", "7day", "B", "Track 3", 20);
        store
    }

    fn add_catalog(store: &SqliteStatsStore, track: &str, artist: &str, genre: &str) {
        let entry = CatalogEntry {
            track_name: track.to_string(),
            artist_name: artist.to_string(),
            collection_name: None,
            genre: genre.to_string(),
            release_date: None,
            release_year: None,
            duration_ms: None,
            track_price: None,
            collection_price: None,
            country: None,
        };
        let genre_id = store.resolve(&EntityKey::Genre(genre)).unwrap();
        store
            .insert_if_absent(&NewRow::Catalog {
                genre_id,
                entry: &entry,
            })
            .unwrap();
    }

    fn add_weather(store: &SqliteStatsStore, place: &str, date: &str, max: f64, min: f64) {
        let place_id = store.resolve(&EntityKey::Place(place)).unwrap();
        let day = WeatherDay {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            temperature_max: max,
            temperature_min: min,
            precipitation: 2.0,
            snowfall: 1.0,
        };
        store
            .insert_if_absent(&NewRow::Weather {
                place_id,
                day: &day,
            })
            .unwrap();
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn average_playcount_over_period() {
        let store = alice_store();
        let avg = store.average_playcount("alice", "7day").unwrap();
        assert_eq!(avg.count, 3);
        assert!((avg.average - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn average_playcount_empty_period_is_zero() {
        let store = alice_store();
        let avg = store.average_playcount("alice", "overall").unwrap();
        assert_eq!(
            avg,
            PlaycountAverage {
                average: 0.0,
                count: 0
            }
        );
    }

    #[test]
    fn top_artists_sums_per_artist() {
        let store = alice_store();
        let artists = store.top_artists("alice", "7day", 10).unwrap();
        assert_eq!(
            artists,
            vec![
                ArtistPlaycount {
                    artist: "A".to_string(),
                    total_playcount: 80,
                    num_tracks_in_top: 2,
                },
                ArtistPlaycount {
                    artist: "B".to_string(),
                    total_playcount: 20,
                    num_tracks_in_top: 1,
                },
            ]
        );
        assert_eq!(store.top_artists("alice", "7day", 1).unwrap().len(), 1);
    }

    #[test]
    fn top_artists_ties_go_to_first_seen_artist() {
        let store = SqliteStatsStore::in_memory().unwrap();
        add_top_track(&store, "bob", "7day", "Zeta", "z", 10);
        add_top_track(&store, "bob", "7day", "Alpha", "a", 10);

        let names: Vec<String> = store
            .top_artists("bob", "7day", 10)
            .unwrap()
            .into_iter()
            .map(|a| a.artist)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn top_tracks_ordered_by_playcount() {
        let store = alice_store();
        let tracks = store.top_tracks("alice", "7day", 2).unwrap();
        assert_eq!(
            tracks,
            vec![
                TrackPlaycount {
                    track: "Track 1".to_string(),
                    artist: "A".to_string(),
                    playcount: 50,
                },
                TrackPlaycount {
                    track: "Track 2".to_string(),
                    artist: "A".to_string(),
                    playcount: 30,
                },
            ]
        );
    }

    #[test]
    fn top_tracks_ties_keep_insertion_order() {
        let store = SqliteStatsStore::in_memory().unwrap();
        add_top_track(&store, "bob", "7day", "X", "second", 5);
        add_top_track(&store, "bob", "7day", "X", "first", 5);

        let tracks = store.top_tracks("bob", "7day", 10).unwrap();
        assert_eq!(tracks[0].track, "second");
        assert_eq!(tracks[1].track, "first");
    }

    #[test]
    fn unknown_subject_is_not_found() {
        let store = alice_store();
        let err = store.top_tracks("mallory", "7day", 10).unwrap_err();
        assert!(matches!(err, StatsError::NotFound { .. }));
        assert!(err.to_string().contains("mallory"));

        assert!(store.average_playcount("mallory", "7day").is_err());
        assert!(store.scrobble_summary("mallory").is_err());
    }

    #[test]
    fn top_genres_joins_catalog_by_names() {
        let store = alice_store();
        add_catalog(&store, "Track 1", "A", "Rock");
        add_catalog(&store, "Track 3", "B", "Rock");
        add_catalog(&store, "Track 2", "A", "Pop");
        // same title, other artist: must not match alice's entries
        add_catalog(&store, "Track 1", "Someone Else", "Jazz");

        let genres = store.top_genres("alice", "7day", 10).unwrap();
        assert_eq!(
            genres,
            vec![
                GenrePlaycount {
                    genre: "Rock".to_string(),
                    total_playcount: 70,
                    num_tracks_in_top: 2,
                },
                GenrePlaycount {
                    genre: "Pop".to_string(),
                    total_playcount: 30,
                    num_tracks_in_top: 1,
                },
            ]
        );
    }

    #[test]
    fn scrobble_summary_counts_distinct_tracks() {
        let store = alice_store();
        store
            .with_write_transaction(|tx| {
                let profile_id = lookup(tx, &EntityKey::Subject("alice"))?.unwrap();
                let track_ids: Vec<i64> = tx
                    .prepare("SELECT id FROM tracks ORDER BY id LIMIT 2")?
                    .query_map([], |r| r.get(0))?
                    .collect::<Result<_, _>>()?;
                for (track_id, at) in [
                    (track_ids[0], "2024-03-01 10:00"),
                    (track_ids[0], "2024-03-01 11:00"),
                    (track_ids[1], "2024-03-01 12:00"),
                ] {
                    dedup::insert_if_absent(
                        tx,
                        &NewRow::Scrobble {
                            profile_id,
                            track_id,
                            scrobbled_at: at,
                        },
                    )?;
                }
                Ok(())
            })
            .unwrap();

        let summary = store.scrobble_summary("alice").unwrap();
        assert_eq!(
            summary,
            ScrobbleSummary {
                scrobbles: 3,
                distinct_tracks: 2
            }
        );
    }

    #[test]
    fn weather_averages_over_inclusive_range() {
        let store = SqliteStatsStore::in_memory().unwrap();
        add_weather(&store, "Ann Arbor", "2024-01-01", 2.0, -4.0);
        add_weather(&store, "Ann Arbor", "2024-01-02", 4.0, -2.0);
        add_weather(&store, "Ann Arbor", "2024-01-03", 100.0, 100.0);

        let averages = store
            .weather_averages("Ann Arbor", date("2024-01-01"), date("2024-01-02"))
            .unwrap()
            .unwrap();
        assert_eq!(averages.days, 2);
        assert!((averages.temperature_max - 3.0).abs() < 1e-9);
        assert!((averages.temperature_min + 3.0).abs() < 1e-9);
        assert!((averages.precipitation - 2.0).abs() < 1e-9);
    }

    #[test]
    fn weather_averages_empty_range_is_none() {
        let store = SqliteStatsStore::in_memory().unwrap();
        add_weather(&store, "Ann Arbor", "2024-01-01", 2.0, -4.0);

        let outside = store
            .weather_averages("Ann Arbor", date("2023-01-01"), date("2023-12-31"))
            .unwrap();
        assert_eq!(outside, None);

        let inverted = store
            .weather_averages("Ann Arbor", date("2024-01-02"), date("2024-01-01"))
            .unwrap();
        assert_eq!(inverted, None);
    }

    #[test]
    fn weather_for_unknown_place_is_not_found() {
        let store = SqliteStatsStore::in_memory().unwrap();
        let err = store
            .weather_averages("Atlantis", date("2024-01-01"), date("2024-01-02"))
            .unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }
}
