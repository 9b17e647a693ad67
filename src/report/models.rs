use crate::stats_store::{ArtistPlaycount, GenrePlaycount, TrackPlaycount};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MusicReport {
    pub username: String,
    pub period: String,
    pub num_toptracks: u64,
    /// Rounded to 2 decimals.
    pub avg_playcount: f64,
    pub top_artists: Vec<ArtistPlaycount>,
    pub top_tracks: Vec<TrackPlaycount>,
    pub recent_scrobbles: u64,
    pub distinct_recent_tracks: u64,
    pub top_genres: Vec<GenrePlaycount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Temperature {
    pub celsius: f64,
    pub fahrenheit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherReportAverages {
    pub days: u64,
    pub max_temperature: Temperature,
    pub min_temperature: Temperature,
    pub precipitation_mm_per_day: f64,
    pub snowfall_cm_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub place: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    pub end_date: String,
    /// `None` when the store holds no observation in the range.
    pub averages: Option<WeatherReportAverages>,
}
