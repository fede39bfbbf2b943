//! Command-line and environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;

use crate::ids::IdPolicy;
use crate::store::{default_db_path, DEFAULT_BUSY_TIMEOUT};

/// Default log file name inside the temp directory.
const DEFAULT_LOG_FILE: &str = "user-registry.log";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "user-registry",
    version,
    about = "Register people into a local SQLite database"
)]
pub struct AppConfig {
    /// SQLite database file. Defaults to ~/.user-registry/user-registry.sqlite.
    #[arg(long, env = "USER_REGISTRY_DB")]
    pub db_path: Option<PathBuf>,

    /// How ids are assigned to new registrants.
    #[arg(long, value_enum, default_value_t = IdPolicy::Random)]
    pub ids: IdPolicy,

    /// Milliseconds to wait for a database locked by another process.
    #[arg(long, env = "USER_REGISTRY_BUSY_TIMEOUT_MS")]
    pub busy_timeout_ms: Option<u64>,

    /// Write tracing output to the log file.
    #[arg(long)]
    pub logs: bool,

    /// Log file location. Defaults to a file in the temp directory.
    #[arg(long, env = "USER_REGISTRY_LOG")]
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Database path from the flag or environment, else the home directory
    /// default.
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path().ok_or_else(|| anyhow!("could not locate home directory")),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout_ms
            .map_or(DEFAULT_BUSY_TIMEOUT, Duration::from_millis)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| env::temp_dir().join(DEFAULT_LOG_FILE))
    }
}
