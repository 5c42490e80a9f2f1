//! SQLite-backed position selection and evaluation write-back.

use sqlx::SqlitePool;

use super::helpers::{encode_score, encode_status};
use crate::evaluation::{EvaluationOutcome, PositionJob};
use crate::persistence::traits::PositionRepository;
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct JobRow {
    position_id: i64,
    fen: String,
}

impl From<JobRow> for PositionJob {
    fn from(r: JobRow) -> Self {
        Self {
            position_id: r.position_id,
            fen: r.fen,
        }
    }
}

/// SQLite implementation of [`PositionRepository`].
pub struct SqlitePositionRepository {
    pool: SqlitePool,
}

impl SqlitePositionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PositionRepository for SqlitePositionRepository {
    async fn select_unevaluated(
        &self,
        limit: usize,
        target_depth: u8,
        prefer_game: Option<&str>,
    ) -> Result<Vec<PositionJob>, PersistenceError> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT p.position_id, p.fen
            FROM positions p
            WHERE p.eval_depth IS NULL OR p.eval_depth < ?
            ORDER BY
                CASE WHEN ? IS NOT NULL AND EXISTS (
                    SELECT 1 FROM moves m
                    JOIN game_moves gm ON gm.move_id = m.move_id
                    WHERE m.position_id = p.position_id AND gm.game_id = ?
                ) THEN 0 ELSE 1 END,
                p.position_id
            LIMIT ?
            "#,
        )
        .bind(i64::from(target_depth))
        .bind(prefer_game)
        .bind(prefer_game)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PositionJob::from).collect())
    }

    async fn positions_for_game(
        &self,
        game_id: &str,
        target_depth: u8,
    ) -> Result<Vec<PositionJob>, PersistenceError> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT p.position_id, p.fen
            FROM game_moves gm
            JOIN moves m ON m.move_id = gm.move_id
            JOIN positions p ON p.position_id = m.position_id
            WHERE gm.game_id = ? AND (p.eval_depth IS NULL OR p.eval_depth < ?)
            GROUP BY p.position_id, p.fen
            ORDER BY MIN(gm.move_num * 2 + (gm.side = 'b'))
            "#,
        )
        .bind(game_id)
        .bind(i64::from(target_depth))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PositionJob::from).collect())
    }

    async fn write_evaluation(
        &self,
        position_id: i64,
        outcome: &EvaluationOutcome,
    ) -> Result<bool, PersistenceError> {
        let depth = i64::from(outcome.depth());
        let mut slots: [(Option<&str>, Option<i32>, Option<&str>); 3] = [(None, None, None); 3];
        for (slot, candidate) in slots.iter_mut().zip(outcome.candidates()) {
            let Some(score) = candidate.score() else {
                break;
            };
            let (kind, value) = encode_score(&score);
            *slot = (Some(candidate.uci.as_str()), Some(value), Some(kind));
        }
        let [first, second, third] = slots;

        // A sentinel raises the depth but keeps whatever candidates an
        // earlier, shallower search stored.
        let updated = sqlx::query(
            r#"
            UPDATE positions SET
                eval_depth = ?1, eval_status = ?2,
                first_move       = CASE WHEN ?3 THEN ?4  ELSE first_move       END,
                first_eval       = CASE WHEN ?3 THEN ?5  ELSE first_eval       END,
                first_eval_type  = CASE WHEN ?3 THEN ?6  ELSE first_eval_type  END,
                second_move      = CASE WHEN ?3 THEN ?7  ELSE second_move      END,
                second_eval      = CASE WHEN ?3 THEN ?8  ELSE second_eval      END,
                second_eval_type = CASE WHEN ?3 THEN ?9  ELSE second_eval_type END,
                third_move       = CASE WHEN ?3 THEN ?10 ELSE third_move       END,
                third_eval       = CASE WHEN ?3 THEN ?11 ELSE third_eval       END,
                third_eval_type  = CASE WHEN ?3 THEN ?12 ELSE third_eval_type  END
            WHERE position_id = ?13 AND (eval_depth IS NULL OR eval_depth < ?1)
            "#,
        )
        .bind(depth)
        .bind(encode_status(outcome))
        .bind(outcome.is_evaluated())
        .bind(first.0)
        .bind(first.1)
        .bind(first.2)
        .bind(second.0)
        .bind(second.1)
        .bind(second.2)
        .bind(third.0)
        .bind(third.1)
        .bind(third.2)
        .bind(position_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            return Ok(true);
        }

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM positions WHERE position_id = ?")
                .bind(position_id)
                .fetch_optional(&self.pool)
                .await?;
        match exists {
            Some(_) => {
                tracing::debug!(position_id, depth, "Stale evaluation rejected");
                Ok(false)
            }
            None => Err(PersistenceError::UnknownPosition(position_id)),
        }
    }
}
