//! SQLite-backed read queries for analytics.

use analysis::{GameSummary, PlyRecord};
use chess::GameResult;
use sqlx::SqlitePool;

use super::helpers::{decode_candidates, decode_side};
use crate::persistence::traits::AnalyticsRepository;
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct PlyRow {
    game_id: String,
    move_num: i64,
    side: String,
    move_uci: String,
    move_san: String,
    clock: Option<f64>,
    fen: String,
    eval_depth: Option<i64>,
    first_move: Option<String>,
    first_eval: Option<i64>,
    first_eval_type: Option<String>,
    second_move: Option<String>,
    second_eval: Option<i64>,
    second_eval_type: Option<String>,
    third_move: Option<String>,
    third_eval: Option<i64>,
    third_eval_type: Option<String>,
}

impl From<PlyRow> for PlyRecord {
    fn from(r: PlyRow) -> Self {
        Self {
            game_id: r.game_id,
            move_number: r.move_num as u32,
            side: decode_side(&r.side),
            move_uci: r.move_uci,
            move_san: r.move_san,
            clock_seconds: r.clock,
            fen: r.fen,
            depth: r.eval_depth.map(|d| d as u32),
            candidates: decode_candidates([
                (r.first_move, r.first_eval, r.first_eval_type),
                (r.second_move, r.second_eval, r.second_eval_type),
                (r.third_move, r.third_eval, r.third_eval_type),
            ]),
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    game_id: String,
    white: String,
    black: String,
    white_rating: Option<i64>,
    black_rating: Option<i64>,
    result: String,
    occurred_at: Option<String>,
    eco: Option<String>,
    time_control: Option<String>,
}

impl From<SummaryRow> for GameSummary {
    fn from(r: SummaryRow) -> Self {
        Self {
            game_id: r.game_id,
            white: r.white,
            black: r.black,
            white_rating: r.white_rating.map(|v| v as i32),
            black_rating: r.black_rating.map(|v| v as i32),
            result: GameResult::parse(&r.result),
            occurred_at: r.occurred_at,
            eco: r.eco,
            time_control: r.time_control,
        }
    }
}

/// SQLite implementation of [`AnalyticsRepository`].
pub struct SqliteAnalyticsRepository {
    pool: SqlitePool,
}

impl SqliteAnalyticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AnalyticsRepository for SqliteAnalyticsRepository {
    async fn game_plies(&self, game_id: &str) -> Result<Vec<PlyRecord>, PersistenceError> {
        let rows: Vec<PlyRow> = sqlx::query_as(
            r#"
            SELECT gm.game_id, gm.move_num, gm.side, m.move_uci, m.move_san, gm.clock,
                   p.fen, p.eval_depth,
                   p.first_move,  p.first_eval,  p.first_eval_type,
                   p.second_move, p.second_eval, p.second_eval_type,
                   p.third_move,  p.third_eval,  p.third_eval_type
            FROM game_moves gm
            JOIN moves m ON m.move_id = gm.move_id
            JOIN positions p ON p.position_id = m.position_id
            WHERE gm.game_id = ?
            ORDER BY gm.move_num, gm.side = 'b'
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PlyRecord::from).collect())
    }

    async fn game_summary(&self, game_id: &str) -> Result<Option<GameSummary>, PersistenceError> {
        let row: Option<SummaryRow> = sqlx::query_as(
            r#"
            SELECT g.game_id, w.username AS white, b.username AS black,
                   g.white_rating, g.black_rating, g.result,
                   g.occurred_at, g.eco, g.time_control
            FROM games g
            JOIN users w ON w.user_id = g.white_id
            JOIN users b ON b.user_id = g.black_id
            WHERE g.game_id = ?
            "#,
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(GameSummary::from))
    }
}
