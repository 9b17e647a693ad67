use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scrobble_stats::config::{AppConfig, CliConfig, FileConfig, DEFAULT_BUSY_TIMEOUT_MS};
use scrobble_stats::ingest::{
    collect_listening, pick_catalog_match, unwrap_records, CatalogExtractor, Ingestor,
    RecentScrobblesExtractor, TopTracksExtractor, WeatherExtractor,
};
use scrobble_stats::report::{
    default_report_file_name, music_report, weather_report, write_json_report,
};
use scrobble_stats::stats_store::{SqliteStatsStore, TrackRef};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

#[derive(Parser, Debug)]
#[command(about = "Idempotent listening, catalog and weather ingestion into SQLite")]
struct CliArgs {
    /// Path to the SQLite stats database file.
    #[clap(long, global = true, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the CLI ones.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// How long to wait for another writer to release the database.
    #[clap(long, global = true, default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    pub busy_timeout_ms: u64,

    /// Directory music and weather reports are written to.
    #[clap(long, global = true, value_parser = parse_path)]
    pub report_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a profile with its location. An existing profile is left untouched.
    AddProfile {
        username: String,
        #[clap(long)]
        city: Option<String>,
        #[clap(long)]
        state: Option<String>,
    },
    /// List registered profiles, grouped by location.
    ListProfiles,
    /// Ingest a page of top tracks (a JSON array or a `toptracks` API payload).
    IngestTopTracks {
        #[clap(long)]
        user: String,
        #[clap(long, default_value = "7day")]
        period: String,
        #[clap(value_parser = parse_path)]
        file: PathBuf,
        /// Maximum number of new rows; defaults to `max_new_rows`.
        #[clap(long)]
        budget: Option<usize>,
    },
    /// Ingest a page of recent scrobbles (scraped rows or a `recenttracks` API payload).
    IngestScrobbles {
        #[clap(long)]
        user: String,
        #[clap(value_parser = parse_path)]
        file: PathBuf,
        #[clap(long)]
        budget: Option<usize>,
    },
    /// One collection run: top tracks and scrobbles sharing the row budget.
    Collect {
        #[clap(long)]
        user: String,
        #[clap(long, default_value = "7day")]
        period: String,
        #[clap(long, value_parser = parse_path)]
        top_tracks: PathBuf,
        #[clap(long, value_parser = parse_path)]
        scrobbles: PathBuf,
        #[clap(long)]
        max_new_rows: Option<usize>,
    },
    /// Ingest storefront search results. With --track and --artist only the
    /// best match is stored, under the queried names.
    IngestCatalog {
        #[clap(value_parser = parse_path)]
        file: PathBuf,
        #[clap(long, requires = "artist")]
        track: Option<String>,
        #[clap(long, requires = "track")]
        artist: Option<String>,
        #[clap(long)]
        budget: Option<usize>,
    },
    /// Ingest daily weather (a JSON array of days or an archive payload with `daily`).
    IngestWeather {
        #[clap(long)]
        place: String,
        #[clap(value_parser = parse_path)]
        file: PathBuf,
        #[clap(long)]
        budget: Option<usize>,
    },
    /// Print row counts per table and the storefront lookup backlog as JSON.
    Status,
    /// Print tracks that have no storefront entry yet.
    MissingCatalog {
        #[clap(long, default_value_t = 25)]
        limit: usize,
    },
    /// Write the music report of a user.
    MusicReport {
        #[clap(long)]
        user: String,
        #[clap(long, default_value = "7day")]
        period: String,
        #[clap(long, value_parser = parse_path)]
        out: Option<PathBuf>,
    },
    /// Write the weather report of a place over a date range.
    WeatherReport {
        #[clap(long)]
        place: String,
        #[clap(long, value_parser = parse_date)]
        start: NaiveDate,
        #[clap(long, value_parser = parse_date)]
        end: NaiveDate,
        #[clap(long, value_parser = parse_path)]
        out: Option<PathBuf>,
    },
}

fn read_records(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {:?}", path))?;
    let payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {:?}", path))?;
    let records = unwrap_records(&payload);
    info!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.db.clone(),
        busy_timeout_ms: cli_args.busy_timeout_ms,
        report_dir: cli_args.report_dir.clone(),
        ..Default::default()
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening stats database at {:?}...", config.db_path);
    let store = SqliteStatsStore::new(&config.db_path, config.busy_timeout)?;

    match cli_args.command {
        Command::AddProfile { username, city, state } => {
            let id = store.register_profile(&username, city.as_deref(), state.as_deref())?;
            println!("{}\t{}", id, username);
        }
        Command::ListProfiles => {
            for username in store.list_usernames()? {
                let (city, state) = store.profile_location(&username)?.unwrap_or_default();
                println!(
                    "{}\t{}\t{}",
                    username,
                    city.unwrap_or_default(),
                    state.unwrap_or_default()
                );
            }
        }
        Command::IngestTopTracks {
            user,
            period,
            file,
            budget,
        } => {
            let records = read_records(&file)?;
            let outcome = Ingestor::new(store, TopTracksExtractor::new(user, period))
                .ingest(&records, budget.unwrap_or(config.max_new_rows))?;
            print_json(&outcome)?;
        }
        Command::IngestScrobbles { user, file, budget } => {
            let records = read_records(&file)?;
            let outcome = Ingestor::new(store, RecentScrobblesExtractor::new(user))
                .ingest(&records, budget.unwrap_or(config.max_new_rows))?;
            print_json(&outcome)?;
        }
        Command::Collect {
            user,
            period,
            top_tracks,
            scrobbles,
            max_new_rows,
        } => {
            let top_tracks = read_records(&top_tracks)?;
            let scrobbles = read_records(&scrobbles)?;
            let summary = collect_listening(
                &store,
                &user,
                &period,
                &top_tracks,
                &scrobbles,
                max_new_rows.unwrap_or(config.max_new_rows),
            )?;
            print_json(&summary)?;
        }
        Command::IngestCatalog {
            file,
            track,
            artist,
            budget,
        } => {
            let records = read_records(&file)?;
            let budget = budget.unwrap_or(config.max_new_rows);
            let outcome = match (track, artist) {
                (Some(track), Some(artist)) => {
                    let Some(best) = pick_catalog_match(&track, &artist, &records) else {
                        warn!("No storefront results for '{}' by '{}'", track, artist);
                        return Ok(());
                    };
                    let extractor = CatalogExtractor::for_query(TrackRef {
                        name: track,
                        artist,
                    });
                    Ingestor::new(store, extractor).ingest(std::iter::once(best), budget)?
                }
                _ => Ingestor::new(store, CatalogExtractor::new()).ingest(&records, budget)?,
            };
            print_json(&outcome)?;
        }
        Command::IngestWeather {
            place,
            file,
            budget,
        } => {
            let records = read_records(&file)?;
            let outcome = Ingestor::new(store, WeatherExtractor::new(place))
                .ingest(&records, budget.unwrap_or(config.max_new_rows))?;
            print_json(&outcome)?;
        }
        Command::Status => {
            print_json(&store.status()?)?;
        }
        Command::MissingCatalog { limit } => {
            for track in store.tracks_missing_catalog(limit)? {
                println!("{}\t{}", track.name, track.artist);
            }
        }
        Command::MusicReport { user, period, out } => {
            let report = music_report(&store, &user, &period, config.report_limit)?;
            let path = out.unwrap_or_else(|| {
                config
                    .report_dir
                    .join(default_report_file_name(&user, &period))
            });
            write_json_report(&path, &report)?;
        }
        Command::WeatherReport {
            place,
            start,
            end,
            out,
        } => {
            if start > end {
                bail!("Start date {} is after end date {}", start, end);
            }
            let report = weather_report(&store, &place, start, end)?;
            if report.averages.is_none() {
                warn!("No weather observations for {} between {} and {}", place, start, end);
            }
            let path = out.unwrap_or_else(|| {
                config.report_dir.join(
                    format!("weather_avg_{}_{}_{}.json", place, start, end)
                        .replace(['/', '\\', ' '], "_"),
                )
            });
            write_json_report(&path, &report)?;
        }
    }

    Ok(())
}
