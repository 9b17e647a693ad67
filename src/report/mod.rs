//! Reports assembled from the aggregation queries.

mod models;

pub use models::{MusicReport, Temperature, WeatherReport, WeatherReportAverages};

use crate::error::StatsResult;
use crate::stats_store::ListeningStatsStore;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn temperature(celsius: f64) -> Temperature {
    Temperature {
        celsius: round2(celsius),
        fahrenheit: round2(celsius_to_fahrenheit(celsius)),
    }
}

pub fn music_report(
    store: &dyn ListeningStatsStore,
    username: &str,
    period: &str,
    limit: usize,
) -> StatsResult<MusicReport> {
    let average = store.average_playcount(username, period)?;
    let scrobbles = store.scrobble_summary(username)?;

    Ok(MusicReport {
        username: username.to_string(),
        period: period.to_string(),
        num_toptracks: average.count,
        avg_playcount: round2(average.average),
        top_artists: store.top_artists(username, period, limit)?,
        top_tracks: store.top_tracks(username, period, limit)?,
        recent_scrobbles: scrobbles.scrobbles,
        distinct_recent_tracks: scrobbles.distinct_tracks,
        top_genres: store.top_genres(username, period, limit)?,
    })
}

pub fn weather_report(
    store: &dyn ListeningStatsStore,
    place: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> StatsResult<WeatherReport> {
    let averages = store
        .weather_averages(place, start_date, end_date)?
        .map(|averages| WeatherReportAverages {
            days: averages.days,
            max_temperature: temperature(averages.temperature_max),
            min_temperature: temperature(averages.temperature_min),
            precipitation_mm_per_day: round2(averages.precipitation),
            snowfall_cm_per_day: round2(averages.snowfall),
        });

    Ok(WeatherReport {
        place: place.to_string(),
        start_date: start_date.format("%Y-%m-%d").to_string(),
        end_date: end_date.format("%Y-%m-%d").to_string(),
        averages,
    })
}

/// `music_avg_{username}_{period}.json`, with path separators replaced.
pub fn default_report_file_name(username: &str, period: &str) -> String {
    format!("music_avg_{}_{}.json", username, period).replace(['/', '\\'], "_")
}

pub fn write_json_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("Failed to write report to {:?}", path))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Report written to {:?}", path);
    Ok(())
}
