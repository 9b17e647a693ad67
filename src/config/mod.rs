mod file_config;

pub use file_config::FileConfig;

use crate::ingest::DEFAULT_MAX_NEW_ROWS;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_REPORT_LIMIT: usize = 10;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub max_new_rows: usize,
    pub report_limit: usize,
    pub report_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            max_new_rows: DEFAULT_MAX_NEW_ROWS,
            report_limit: DEFAULT_REPORT_LIMIT,
            report_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    /// Default row budget of one ingestion run.
    pub max_new_rows: usize,
    /// Length of the top-N lists in music reports.
    pub report_limit: usize,
    pub report_dir: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db or in config file")
            })?;

        let busy_timeout_ms = file.busy_timeout_ms.unwrap_or(cli.busy_timeout_ms);
        let max_new_rows = file.max_new_rows.unwrap_or(cli.max_new_rows);

        let report_limit = file.report_limit.unwrap_or(cli.report_limit);
        if report_limit == 0 {
            bail!("report_limit must be greater than 0");
        }

        let report_dir = file
            .report_dir
            .map(PathBuf::from)
            .or_else(|| cli.report_dir.clone());
        if let Some(dir) = &report_dir {
            if !dir.is_dir() {
                bail!("Report directory does not exist: {:?}", dir);
            }
        }

        Ok(AppConfig {
            db_path,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            max_new_rows,
            report_limit,
            report_dir: report_dir.unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}
