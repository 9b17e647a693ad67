//! One listening collection run: a top tracks API page plus a page of recent
//! scrobbles, sharing a single row budget.

use super::ingestor::{IngestOutcome, Ingestor};
use super::lastfm::{RecentScrobblesExtractor, TopTracksExtractor};
use crate::error::StatsResult;
use crate::stats_store::{EntityKey, SqliteStatsStore};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

pub const DEFAULT_MAX_NEW_ROWS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListeningRunSummary {
    pub username: String,
    pub period: String,
    pub rows_added_api: usize,
    pub rows_added_scrape: usize,
    pub rows_added_total: usize,
    pub top_tracks: IngestOutcome,
    pub scrobbles: IngestOutcome,
}

/// Splits `max_new_rows` into the top tracks share and the scrobbles share.
/// An odd budget gives the extra row to the scrobbles.
pub fn split_budget(max_new_rows: usize) -> (usize, usize) {
    let api_budget = max_new_rows / 2;
    (api_budget, max_new_rows - api_budget)
}

pub fn collect_listening(
    store: &SqliteStatsStore,
    username: &str,
    period: &str,
    top_tracks_page: &[Value],
    scrobbles_page: &[Value],
    max_new_rows: usize,
) -> StatsResult<ListeningRunSummary> {
    store.resolve(&EntityKey::Subject(username))?;

    let (api_budget, scrape_budget) = split_budget(max_new_rows);
    info!(
        "Collecting listening data for {} ({}): {} top track rows, {} scrobble rows",
        username, period, api_budget, scrape_budget
    );

    let top_tracks = Ingestor::new(store.clone(), TopTracksExtractor::new(username, period))
        .ingest(top_tracks_page, api_budget)?;
    let scrobbles = Ingestor::new(store.clone(), RecentScrobblesExtractor::new(username))
        .ingest(scrobbles_page, scrape_budget)?;

    Ok(ListeningRunSummary {
        username: username.to_string(),
        period: period.to_string(),
        rows_added_api: top_tracks.inserted,
        rows_added_scrape: scrobbles.inserted,
        rows_added_total: top_tracks.inserted + scrobbles.inserted,
        top_tracks,
        scrobbles,
    })
}
