//! Configuration for chesscard.
//!
//! Every tunable has a compile-time default and a dedicated environment
//! variable. Command-line flags take precedence over both; see
//! [`scheduler_config`].

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::evaluation::{SchedulerConfig, MAX_DEPTH};

const DEV_DATA_DIR: &str = "./data";
const DB_FILE_NAME: &str = "chesscard.db";

/// Default search depth for evaluations.
const DEFAULT_DEPTH: u8 = 15;

/// Default wall-clock budget of one evaluation batch (in seconds).
const DEFAULT_BUDGET_SECS: u64 = 50;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("depth {0} is outside 1..={MAX_DEPTH}")]
    DepthOutOfRange(u8),
    #[error("worker count must be at least 1")]
    NoWorkers,
}

/// Get the data directory.
///
/// Priority:
/// 1. `CHESSCARD_DATA_DIR` env variable if set
/// 2. The platform data directory (e.g. `~/.local/share/chesscard`)
/// 3. `./data` as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESSCARD_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(dirs) = ProjectDirs::from("", "", "chesscard") {
        return dirs.data_dir().to_path_buf();
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Get the SQLite database path.
///
/// Priority:
/// 1. `CHESSCARD_DB_PATH` env variable if set
/// 2. `chesscard.db` inside [`get_data_dir`]
pub fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHESSCARD_DB_PATH") {
        return PathBuf::from(path);
    }

    get_data_dir().join(DB_FILE_NAME)
}

/// Get the Stockfish binary path, if configured.
///
/// `None` lets the engine probe common install locations.
pub fn get_stockfish_path() -> Option<PathBuf> {
    std::env::var("CHESSCARD_STOCKFISH_PATH").ok().map(PathBuf::from)
}

/// Get the directory for rolling log files, if configured. Without it logs
/// go to stderr.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("CHESSCARD_LOG_DIR").ok().map(PathBuf::from)
}

/// Get the evaluation depth.
///
/// Priority:
/// 1. `CHESSCARD_DEPTH` env variable if set (falls back to default if the
///    value cannot be parsed as a `u8`)
/// 2. `15` as fallback
pub fn get_depth() -> u8 {
    if let Ok(depth) = std::env::var("CHESSCARD_DEPTH") {
        return depth.parse().unwrap_or(DEFAULT_DEPTH);
    }

    DEFAULT_DEPTH
}

/// Get the number of evaluation workers.
///
/// Priority:
/// 1. `CHESSCARD_WORKERS` env variable if set (falls back to default if the
///    value cannot be parsed as a `usize`)
/// 2. The available parallelism of the machine
pub fn get_workers() -> usize {
    let default = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    if let Ok(workers) = std::env::var("CHESSCARD_WORKERS") {
        return workers.parse().unwrap_or(default);
    }

    default
}

/// Get the evaluation batch budget in seconds.
///
/// Priority:
/// 1. `CHESSCARD_BUDGET_SECS` env variable if set (falls back to default if
///    the value cannot be parsed as a `u64`)
/// 2. `50` seconds as fallback
pub fn get_budget_secs() -> u64 {
    if let Ok(budget) = std::env::var("CHESSCARD_BUDGET_SECS") {
        return budget.parse().unwrap_or(DEFAULT_BUDGET_SECS);
    }

    DEFAULT_BUDGET_SECS
}

/// Build the scheduler configuration from explicit overrides, falling back to
/// the environment and then the defaults.
pub fn scheduler_config(
    depth: Option<u8>,
    workers: Option<usize>,
    budget_secs: Option<u64>,
) -> Result<SchedulerConfig, ConfigError> {
    let depth = depth.unwrap_or_else(get_depth);
    if !(1..=MAX_DEPTH).contains(&depth) {
        return Err(ConfigError::DepthOutOfRange(depth));
    }
    let workers = workers.unwrap_or_else(get_workers);
    if workers == 0 {
        return Err(ConfigError::NoWorkers);
    }

    Ok(SchedulerConfig {
        depth,
        workers,
        budget: Duration::from_secs(budget_secs.unwrap_or_else(get_budget_secs)),
    })
}
