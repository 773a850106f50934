//! Runtime configuration. Everything has a default derived from the user's
//! home directory; two environment variables can override it.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".rsvp-manager";
/// SQLite file holding the persisted roster.
const DB_FILE_NAME: &str = "rsvp.sqlite";
/// Log file written by the tracing subscriber.
const LOG_FILE_NAME: &str = "rsvp.log";
const DEFAULT_LOG_FILTER: &str = "info";

/// Overrides the data directory (database and log file).
pub const DATA_DIR_ENV: &str = "RSVP_DATA_DIR";
/// Tracing filter directive, e.g. `debug` or `rsvp=trace`.
pub const LOG_FILTER_ENV: &str = "RSVP_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    pub log_filter: String,
}

impl AppConfig {
    /// Resolve the configuration from `RSVP_DATA_DIR` / `RSVP_LOG`, falling
    /// back to `~/.rsvp-manager` and `info`.
    pub fn from_env() -> Result<Self> {
        let data_dir = match env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };
        let log_filter = env::var(LOG_FILTER_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Ok(Self::in_dir(data_dir, log_filter))
    }

    /// Lay out the files inside `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>, log_filter: impl Into<String>) -> Self {
        let data_dir = data_dir.into();
        Self {
            database_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            data_dir,
            log_filter: log_filter.into(),
        }
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
