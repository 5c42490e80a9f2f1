//! Async repository trait definitions for the persistence layer.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send`, as required by `tokio::spawn`.

use super::{IngestReport, PersistenceError};
use crate::evaluation::{EvaluationOutcome, PositionJob};
use analysis::{GameSummary, PlyRecord};
use chess::GameArchive;
use std::future::Future;

/// Idempotent ingest of games, users and plies.
///
/// Inserts are keyed on natural keys (username, game id, position key,
/// (position, move)) and are no-ops when the key already exists. Each game
/// is written in its own transaction together with its plies.
pub trait IngestRepository: Send + Sync {
    fn ingest(
        &self,
        archive: &GameArchive,
    ) -> impl Future<Output = Result<IngestReport, PersistenceError>> + Send;
    fn game_exists(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    /// Set the user's last-fetch time, creating the user if missing.
    fn record_user_fetch(
        &self,
        username: &str,
        at: u64,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Set the user's account-open time, creating the user if missing.
    fn record_account_open(
        &self,
        username: &str,
        opened_at: u64,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// Selection of positions to evaluate and the write-back of results.
///
/// `write_evaluation` is the only operation that mutates a stored position.
/// It must never lower a position's evaluation depth.
pub trait PositionRepository: Send + Sync {
    fn select_unevaluated(
        &self,
        limit: usize,
        target_depth: u8,
        prefer_game: Option<&str>,
    ) -> impl Future<Output = Result<Vec<PositionJob>, PersistenceError>> + Send;
    fn positions_for_game(
        &self,
        game_id: &str,
        target_depth: u8,
    ) -> impl Future<Output = Result<Vec<PositionJob>, PersistenceError>> + Send;
    /// Returns `Ok(false)` when the stored depth is already at least the
    /// outcome's depth.
    fn write_evaluation(
        &self,
        position_id: i64,
        outcome: &EvaluationOutcome,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
}

/// Read queries feeding the analytics engine.
pub trait AnalyticsRepository: Send + Sync {
    /// Plies of one game in play order, joined with their positions'
    /// evaluations.
    fn game_plies(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Vec<PlyRecord>, PersistenceError>> + Send;
    fn game_summary(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Option<GameSummary>, PersistenceError>> + Send;
}
