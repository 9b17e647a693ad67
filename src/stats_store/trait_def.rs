//! ListeningStatsStore trait definition.

use super::models::{
    ArtistPlaycount, GenrePlaycount, PlaycountAverage, ScrobbleSummary, TrackPlaycount,
    WeatherAverages,
};
use crate::error::StatsResult;
use chrono::NaiveDate;

/// Read-only aggregations over the joined listening, catalog and weather tables.
///
/// Every query that names a subject or a place fails with
/// [`StatsError::NotFound`](crate::error::StatsError::NotFound) when it is not
/// in the store.
pub trait ListeningStatsStore: Send + Sync {
    // =========================================================================
    // Top tracks
    // =========================================================================

    /// Mean playcount over the subject's top track entries for `period`.
    /// `(0.0, 0)` when there are none.
    fn average_playcount(&self, username: &str, period: &str) -> StatsResult<PlaycountAverage>;

    /// Playcount summed per artist, highest first; ties go to the older artist.
    fn top_artists(
        &self,
        username: &str,
        period: &str,
        limit: usize,
    ) -> StatsResult<Vec<ArtistPlaycount>>;

    /// Top track entries by playcount; ties keep insertion order.
    fn top_tracks(
        &self,
        username: &str,
        period: &str,
        limit: usize,
    ) -> StatsResult<Vec<TrackPlaycount>>;

    /// Playcount summed per storefront genre. Only top tracks that have a
    /// catalog entry contribute.
    fn top_genres(
        &self,
        username: &str,
        period: &str,
        limit: usize,
    ) -> StatsResult<Vec<GenrePlaycount>>;

    // =========================================================================
    // Scrobbles
    // =========================================================================

    fn scrobble_summary(&self, username: &str) -> StatsResult<ScrobbleSummary>;

    // =========================================================================
    // Weather
    // =========================================================================

    /// Means over `start..=end`. `None` when the range holds no observation.
    fn weather_averages(
        &self,
        place: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StatsResult<Option<WeatherAverages>>;
}
