//! SQLite-backed ingest of games, users and plies.

use std::collections::HashSet;

use chess::pgn::SkippedGame;
use chess::{position_key, side_to_move, ArchivePly, GameArchive, GameRecord, Side};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::helpers::encode_side;
use crate::persistence::traits::IngestRepository;
use crate::persistence::{IngestReport, PersistenceError};

/// A ply whose FEN has been reduced to its position key.
struct ValidPly<'a> {
    key: String,
    side: Side,
    source: &'a ArchivePly,
}

fn validate_ply(ply: &ArchivePly) -> Result<ValidPly<'_>, String> {
    let key = position_key(&ply.fen).map_err(|e| format!("ply {}: {}", ply.move_number, e))?;
    let side = side_to_move(&key).map_err(|e| e.to_string())?;
    if ply.move_number == 0 {
        return Err("move number 0".to_string());
    }
    if !(4..=5).contains(&ply.move_uci.len()) {
        return Err(format!("malformed move {:?}", ply.move_uci));
    }
    Ok(ValidPly {
        key,
        side,
        source: ply,
    })
}

fn validate_game<'a>(
    game: &GameRecord,
    plies: impl Iterator<Item = &'a ArchivePly>,
) -> Result<Vec<ValidPly<'a>>, String> {
    for (name, value) in [("game id", &game.game_id), ("White", &game.white), ("Black", &game.black)] {
        if value.trim().is_empty() {
            return Err(format!("missing required header: {name}"));
        }
    }
    plies.map(validate_ply).collect()
}

/// SQLite implementation of [`IngestRepository`].
pub struct SqliteIngestRepository {
    pool: SqlitePool,
}

impl SqliteIngestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert_plies(
        tx: &mut Transaction<'_, Sqlite>,
        game_id: &str,
        plies: &[ValidPly<'_>],
        report: &mut IngestReport,
    ) -> Result<(), PersistenceError> {
        for ply in plies {
            report.positions_inserted += sqlx::query(
                "INSERT INTO positions (fen, side_to_move) VALUES (?, ?) ON CONFLICT(fen) DO NOTHING",
            )
            .bind(&ply.key)
            .bind(encode_side(ply.side))
            .execute(&mut **tx)
            .await?
            .rows_affected();

            let position_id: i64 =
                sqlx::query_scalar("SELECT position_id FROM positions WHERE fen = ?")
                    .bind(&ply.key)
                    .fetch_one(&mut **tx)
                    .await?;

            report.moves_inserted += sqlx::query(
                r#"
                INSERT INTO moves (position_id, move_uci, move_san) VALUES (?, ?, ?)
                ON CONFLICT(position_id, move_uci) DO NOTHING
                "#,
            )
            .bind(position_id)
            .bind(&ply.source.move_uci)
            .bind(&ply.source.move_san)
            .execute(&mut **tx)
            .await?
            .rows_affected();

            let move_id: i64 = sqlx::query_scalar(
                "SELECT move_id FROM moves WHERE position_id = ? AND move_uci = ?",
            )
            .bind(position_id)
            .bind(&ply.source.move_uci)
            .fetch_one(&mut **tx)
            .await?;

            report.plies_inserted += sqlx::query(
                r#"
                INSERT INTO game_moves (game_id, move_id, move_num, side, clock)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(game_id, move_num, side) DO NOTHING
                "#,
            )
            .bind(game_id)
            .bind(move_id)
            .bind(i64::from(ply.source.move_number))
            .bind(encode_side(ply.side))
            .bind(ply.source.clock_seconds)
            .execute(&mut **tx)
            .await?
            .rows_affected();
        }
        Ok(())
    }
}

/// Insert the user if missing and return its id.
async fn ensure_user(
    tx: &mut Transaction<'_, Sqlite>,
    username: &str,
) -> Result<(i64, u64), PersistenceError> {
    let inserted = sqlx::query("INSERT INTO users (username) VALUES (?) ON CONFLICT(username) DO NOTHING")
        .bind(username)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    let user_id: i64 = sqlx::query_scalar("SELECT user_id FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(&mut **tx)
        .await?;
    Ok((user_id, inserted))
}

impl IngestRepository for SqliteIngestRepository {
    async fn ingest(&self, archive: &GameArchive) -> Result<IngestReport, PersistenceError> {
        let mut report = IngestReport::default();
        let single = archive.games.len() == 1;

        let mut accepted = Vec::with_capacity(archive.games.len());
        for (index, game) in archive.games.iter().enumerate() {
            match validate_game(game, archive.plies_for(&game.game_id)) {
                Ok(plies) => accepted.push((game, plies)),
                Err(reason) if single => {
                    return Err(PersistenceError::InvalidRecord {
                        game_id: game.game_id.clone(),
                        reason,
                    });
                }
                Err(reason) => {
                    tracing::warn!(game_id = %game.game_id, %reason, "Skipping malformed game");
                    report.skipped.push(SkippedGame {
                        index,
                        game_id: Some(game.game_id.clone()),
                        reason,
                    });
                }
            }
        }

        // Plies may extend games stored by an earlier call; anything else is a gap.
        let archived: HashSet<&str> = archive.games.iter().map(|g| g.game_id.as_str()).collect();
        let mut extra_games: Vec<&str> = Vec::new();
        for ply in &archive.plies {
            let id = ply.game_id.as_str();
            if !archived.contains(id) && !extra_games.contains(&id) {
                extra_games.push(id);
            }
        }
        let mut extras = Vec::with_capacity(extra_games.len());
        for game_id in extra_games {
            if !self.game_exists(game_id).await? {
                return Err(PersistenceError::ReferentialGap(game_id.to_string()));
            }
            let plies = archive
                .plies_for(game_id)
                .map(validate_ply)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| PersistenceError::InvalidRecord {
                    game_id: game_id.to_string(),
                    reason,
                })?;
            extras.push((game_id, plies));
        }

        if !archive.users.is_empty() {
            let mut tx = self.pool.begin().await?;
            for username in &archive.users {
                report.users_inserted += ensure_user(&mut tx, username).await?.1;
            }
            tx.commit().await?;
        }

        for (game, plies) in accepted {
            let mut tx = self.pool.begin().await?;

            let (white_id, white_new) = ensure_user(&mut tx, &game.white).await?;
            let (black_id, black_new) = ensure_user(&mut tx, &game.black).await?;
            report.users_inserted += white_new + black_new;

            let inserted = sqlx::query(
                r#"
                INSERT INTO games
                    (game_id, white_id, black_id, white_rating, black_rating,
                     result, occurred_at, eco, time_control)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(game_id) DO NOTHING
                "#,
            )
            .bind(&game.game_id)
            .bind(white_id)
            .bind(black_id)
            .bind(game.white_rating)
            .bind(game.black_rating)
            .bind(game.result.as_pgn())
            .bind(&game.occurred_at)
            .bind(&game.eco)
            .bind(&game.time_control)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted == 0 {
                report.games_existing += 1;
            } else {
                report.games_inserted += 1;
            }

            Self::insert_plies(&mut tx, &game.game_id, &plies, &mut report).await?;
            tx.commit().await?;
            tracing::debug!(game_id = %game.game_id, plies = plies.len(), "Game ingested");
        }

        for (game_id, plies) in extras {
            let mut tx = self.pool.begin().await?;
            Self::insert_plies(&mut tx, game_id, &plies, &mut report).await?;
            tx.commit().await?;
        }

        tracing::info!(
            games = report.games_inserted,
            existing = report.games_existing,
            positions = report.positions_inserted,
            plies = report.plies_inserted,
            skipped = report.skipped.len(),
            "Ingest complete"
        );
        Ok(report)
    }

    async fn game_exists(&self, game_id: &str) -> Result<bool, PersistenceError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM games WHERE game_id = ?")
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn record_user_fetch(&self, username: &str, at: u64) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, last_fetched) VALUES (?, ?)
            ON CONFLICT(username) DO UPDATE SET last_fetched = excluded.last_fetched
            "#,
        )
        .bind(username)
        .bind(at as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_account_open(
        &self,
        username: &str,
        opened_at: u64,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, account_open) VALUES (?, ?)
            ON CONFLICT(username) DO UPDATE SET account_open = excluded.account_open
            "#,
        )
        .bind(username)
        .bind(opened_at as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
