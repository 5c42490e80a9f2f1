pub mod sqlite;
pub mod traits;

pub use sqlite::{Database, SqliteAnalyticsRepository, SqliteIngestRepository, SqlitePositionRepository};
pub use traits::{AnalyticsRepository, IngestRepository, PositionRepository};

use chess::pgn::SkippedGame;
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Invalid record for game {game_id}: {reason}")]
    InvalidRecord { game_id: String, reason: String },
    #[error("Plies reference unknown game {0}")]
    ReferentialGap(String),
    #[error("Unknown position {0}")]
    UnknownPosition(i64),
}

/// What an ingest call changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub users_inserted: u64,
    pub games_inserted: u64,
    /// Games whose id was already stored; their headers were left untouched.
    pub games_existing: u64,
    pub positions_inserted: u64,
    pub moves_inserted: u64,
    pub plies_inserted: u64,
    pub skipped: Vec<SkippedGame>,
}

impl IngestReport {
    /// Fold another report into this one (e.g. across several archive files).
    pub fn merge(&mut self, other: IngestReport) {
        self.users_inserted += other.users_inserted;
        self.games_inserted += other.games_inserted;
        self.games_existing += other.games_existing;
        self.positions_inserted += other.positions_inserted;
        self.moves_inserted += other.moves_inserted;
        self.plies_inserted += other.plies_inserted;
        self.skipped.extend(other.skipped);
    }
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
