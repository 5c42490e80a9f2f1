use chess::{AnalysisScore, ArchivePly, GameArchive, GameRecord, GameResult, Side};
use engine::TopMove;

use super::Database;
use crate::evaluation::EvaluationOutcome;
use crate::persistence::traits::{AnalyticsRepository, IngestRepository, PositionRepository};
use crate::persistence::PersistenceError;

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
const AFTER_NF3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";

fn record(id: &str, white: &str, black: &str) -> GameRecord {
    GameRecord {
        game_id: id.to_string(),
        white: white.to_string(),
        black: black.to_string(),
        white_rating: Some(1500),
        black_rating: Some(1480),
        result: GameResult::WhiteWin,
        occurred_at: Some("2021-03-04 18:00:00".to_string()),
        eco: Some("C40".to_string()),
        time_control: Some("600".to_string()),
    }
}

fn ply(game_id: &str, move_number: u32, uci: &str, san: &str, clock: f64, fen: &str) -> ArchivePly {
    ArchivePly {
        game_id: game_id.to_string(),
        move_number,
        move_uci: uci.to_string(),
        move_san: san.to_string(),
        clock_seconds: Some(clock),
        fen: fen.to_string(),
    }
}

/// 1. e4 e5 2. Nf3 Nc6
fn open_game(id: &str) -> Vec<ArchivePly> {
    vec![
        ply(id, 1, "e2e4", "e4", 600.0, START),
        ply(id, 1, "e7e5", "e5", 598.0, AFTER_E4),
        ply(id, 2, "g1f3", "Nf3", 590.0, AFTER_E5),
        ply(id, 2, "b8c6", "Nc6", 580.0, AFTER_NF3),
    ]
}

/// 1. e4 e5 2. d4
fn center_game(id: &str) -> Vec<ArchivePly> {
    vec![
        ply(id, 1, "e2e4", "e4", 300.0, START),
        ply(id, 1, "e7e5", "e5", 299.0, AFTER_E4),
        ply(id, 2, "d2d4", "d4", 280.0, AFTER_E5),
    ]
}

fn archive_of(games: Vec<(GameRecord, Vec<ArchivePly>)>) -> GameArchive {
    let mut archive = GameArchive::default();
    for (game, plies) in games {
        archive.push_game(game, plies);
    }
    archive
}

async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

async fn position_id(db: &Database, fen: &str) -> i64 {
    let key = chess::position_key(fen).unwrap();
    sqlx::query_scalar("SELECT position_id FROM positions WHERE fen = ?")
        .bind(key)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

fn evaluated(depth: u8, moves: &[(&str, i32)]) -> EvaluationOutcome {
    EvaluationOutcome::Evaluated {
        depth,
        candidates: moves
            .iter()
            .map(|(uci, cp)| TopMove::new(*uci, AnalysisScore::Centipawns(*cp)))
            .collect(),
    }
}

// ── Ingest ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ingest_single_game() {
    let db = Database::new_in_memory().await.unwrap();
    let archive = archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]);

    let report = db.ingest().ingest(&archive).await.unwrap();

    assert_eq!(report.users_inserted, 2);
    assert_eq!(report.games_inserted, 1);
    assert_eq!(report.positions_inserted, 4);
    assert_eq!(report.moves_inserted, 4);
    assert_eq!(report.plies_inserted, 4);
    assert!(report.skipped.is_empty());
    assert!(db.ingest().game_exists("g1").await.unwrap());
    assert!(!db.ingest().game_exists("g2").await.unwrap());
}

#[tokio::test]
async fn test_reingest_is_a_no_op() {
    let db = Database::new_in_memory().await.unwrap();
    let archive = archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]);
    db.ingest().ingest(&archive).await.unwrap();

    let report = db.ingest().ingest(&archive).await.unwrap();

    assert_eq!(report.users_inserted, 0);
    assert_eq!(report.games_inserted, 0);
    assert_eq!(report.games_existing, 1);
    assert_eq!(report.positions_inserted, 0);
    assert_eq!(report.moves_inserted, 0);
    assert_eq!(report.plies_inserted, 0);
    for (table, expected) in [("users", 2), ("games", 1), ("positions", 4), ("moves", 4), ("game_moves", 4)] {
        assert_eq!(count(&db, table).await, expected, "{table}");
    }
}

#[tokio::test]
async fn test_positions_and_moves_are_shared_across_games() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();

    let report = db
        .ingest()
        .ingest(&archive_of(vec![(record("g2", "bob", "carol"), center_game("g2"))]))
        .await
        .unwrap();

    assert_eq!(report.users_inserted, 1);
    assert_eq!(report.positions_inserted, 0);
    assert_eq!(report.moves_inserted, 1);
    assert_eq!(report.plies_inserted, 3);
    assert_eq!(count(&db, "positions").await, 4);
    assert_eq!(count(&db, "moves").await, 5);
}

#[tokio::test]
async fn test_invalid_single_game_fails_without_writes() {
    let db = Database::new_in_memory().await.unwrap();
    let mut plies = open_game("g1");
    plies[2].fen = "rnbqkbnr/pppp1ppp/8/4p3 w KQkq -".to_string();
    let archive = archive_of(vec![(record("g1", "alice", "bob"), plies)]);

    let err = db.ingest().ingest(&archive).await.unwrap_err();

    assert!(matches!(err, PersistenceError::InvalidRecord { ref game_id, .. } if game_id == "g1"));
    assert_eq!(count(&db, "games").await, 0);
    assert_eq!(count(&db, "positions").await, 0);
}

#[tokio::test]
async fn test_invalid_game_in_archive_is_skipped() {
    let db = Database::new_in_memory().await.unwrap();
    let mut bad = center_game("g2");
    bad[1].fen = "not a position at all".to_string();
    let archive = archive_of(vec![
        (record("g1", "alice", "bob"), open_game("g1")),
        (record("g2", "bob", "carol"), bad),
    ]);

    let report = db.ingest().ingest(&archive).await.unwrap();

    assert_eq!(report.games_inserted, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 1);
    assert_eq!(report.skipped[0].game_id.as_deref(), Some("g2"));
    assert!(!db.ingest().game_exists("g2").await.unwrap());
    assert_eq!(count(&db, "game_moves").await, 4);
}

#[tokio::test]
async fn test_plies_for_unknown_game_are_a_referential_gap() {
    let db = Database::new_in_memory().await.unwrap();
    let mut archive = archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]);
    archive.plies.extend(center_game("ghost"));

    let err = db.ingest().ingest(&archive).await.unwrap_err();

    assert!(matches!(err, PersistenceError::ReferentialGap(ref id) if id == "ghost"));
    assert_eq!(count(&db, "games").await, 0);
    assert_eq!(count(&db, "game_moves").await, 0);
}

#[tokio::test]
async fn test_plies_may_extend_a_stored_game() {
    let db = Database::new_in_memory().await.unwrap();
    let mut plies = open_game("g1");
    let tail = plies.split_off(2);
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), plies)]))
        .await
        .unwrap();

    let archive = GameArchive {
        plies: tail,
        ..Default::default()
    };
    let report = db.ingest().ingest(&archive).await.unwrap();

    assert_eq!(report.plies_inserted, 2);
    assert_eq!(db.analytics().game_plies("g1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_record_user_fetch_creates_and_updates() {
    let db = Database::new_in_memory().await.unwrap();
    let repo = db.ingest();

    repo.record_user_fetch("dave", 1_600_000_000).await.unwrap();
    repo.record_user_fetch("dave", 1_700_000_000).await.unwrap();

    let fetched: Option<i64> = sqlx::query_scalar("SELECT last_fetched FROM users WHERE username = 'dave'")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(fetched, Some(1_700_000_000));
    assert_eq!(count(&db, "users").await, 1);
}

#[tokio::test]
async fn test_record_account_open_keeps_fetch_time() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();
    let repo = db.ingest();

    repo.record_user_fetch("alice", 1_700_000_000).await.unwrap();
    repo.record_account_open("alice", 1_400_000_000).await.unwrap();
    repo.record_account_open("erin", 1_500_000_000).await.unwrap();

    let (opened, fetched): (Option<i64>, Option<i64>) =
        sqlx::query_as("SELECT account_open, last_fetched FROM users WHERE username = 'alice'")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(opened, Some(1_400_000_000));
    assert_eq!(fetched, Some(1_700_000_000));
    assert_eq!(count(&db, "users").await, 3);
}

// ── Positions ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_positions_for_game_in_play_order() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();

    let jobs = db.positions().positions_for_game("g1", 10).await.unwrap();
    let fens: Vec<&str> = jobs.iter().map(|j| j.fen.as_str()).collect();
    let expected: Vec<String> = [START, AFTER_E4, AFTER_E5, AFTER_NF3]
        .iter()
        .map(|f| chess::position_key(f).unwrap())
        .collect();
    assert_eq!(fens, expected);

    // Positions already at the target depth are left out.
    let first = position_id(&db, START).await;
    db.positions()
        .write_evaluation(first, &evaluated(10, &[("e2e4", 30)]))
        .await
        .unwrap();
    assert_eq!(db.positions().positions_for_game("g1", 10).await.unwrap().len(), 3);
    assert_eq!(db.positions().positions_for_game("g1", 11).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_select_unevaluated_prefers_requested_game() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![
            (record("g1", "alice", "bob"), open_game("g1")),
            (record("g2", "bob", "carol"), center_game("g2")),
        ]))
        .await
        .unwrap();

    // g2 only has the first three positions; the Nf3 position belongs to g1.
    let nf3 = position_id(&db, AFTER_NF3).await;
    let jobs = db
        .positions()
        .select_unevaluated(10, 12, Some("g2"))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 4);
    assert_eq!(jobs.last().map(|j| j.position_id), Some(nf3));

    let limited = db.positions().select_unevaluated(2, 12, None).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert!(limited[0].position_id < limited[1].position_id);
}

#[tokio::test]
async fn test_write_evaluation_never_lowers_depth() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();
    let id = position_id(&db, START).await;
    let repo = db.positions();

    assert!(repo
        .write_evaluation(id, &evaluated(10, &[("e2e4", 35), ("d2d4", 30), ("g1f3", 25)]))
        .await
        .unwrap());
    assert!(!repo
        .write_evaluation(id, &evaluated(5, &[("a2a3", -10)]))
        .await
        .unwrap());
    assert!(!repo
        .write_evaluation(id, &EvaluationOutcome::timed_out(10))
        .await
        .unwrap());

    let plies = db.analytics().game_plies("g1").await.unwrap();
    assert_eq!(plies[0].depth, Some(10));
    assert_eq!(plies[0].candidates.len(), 3);
    assert_eq!(plies[0].candidates[0].uci, "e2e4");
    assert_eq!(plies[0].evaluation(), Some(AnalysisScore::Centipawns(35)));
}

#[tokio::test]
async fn test_sentinel_records_depth_without_candidates() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();
    let id = position_id(&db, AFTER_E4).await;

    assert!(db
        .positions()
        .write_evaluation(id, &EvaluationOutcome::failed(8, "engine crashed"))
        .await
        .unwrap());

    let (depth, status, first): (Option<i64>, Option<String>, Option<String>) = sqlx::query_as(
        "SELECT eval_depth, eval_status, first_move FROM positions WHERE position_id = ?",
    )
    .bind(id)
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(depth, Some(8));
    assert_eq!(status.as_deref(), Some("failed"));
    assert_eq!(first, None);
    assert!(db.positions().select_unevaluated(10, 8, None).await.unwrap().iter().all(|j| j.position_id != id));
}

#[tokio::test]
async fn test_deeper_sentinel_keeps_shallower_candidates() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();
    let id = position_id(&db, START).await;
    let repo = db.positions();

    assert!(repo
        .write_evaluation(id, &evaluated(5, &[("e2e4", 35), ("d2d4", 30), ("g1f3", 25)]))
        .await
        .unwrap());
    assert!(repo
        .write_evaluation(id, &EvaluationOutcome::timed_out(10))
        .await
        .unwrap());

    let plies = db.analytics().game_plies("g1").await.unwrap();
    assert_eq!(plies[0].depth, Some(10));
    assert_eq!(plies[0].candidates.len(), 3);
    assert_eq!(plies[0].candidates[0].uci, "e2e4");
    assert!(repo.select_unevaluated(10, 10, None).await.unwrap().iter().all(|j| j.position_id != id));

    // A real result at a greater depth replaces them.
    assert!(repo
        .write_evaluation(id, &evaluated(12, &[("d2d4", 40)]))
        .await
        .unwrap());
    let plies = db.analytics().game_plies("g1").await.unwrap();
    assert_eq!(plies[0].candidates.len(), 1);
    assert_eq!(plies[0].candidates[0].uci, "d2d4");
}

#[tokio::test]
async fn test_write_evaluation_for_unknown_position() {
    let db = Database::new_in_memory().await.unwrap();
    let err = db
        .positions()
        .write_evaluation(999, &evaluated(5, &[("e2e4", 10)]))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistenceError::UnknownPosition(999)));
}

#[tokio::test]
async fn test_mate_scores_round_trip() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();
    let id = position_id(&db, AFTER_E5).await;
    let outcome = EvaluationOutcome::Evaluated {
        depth: 12,
        candidates: vec![
            TopMove::new("g1f3", AnalysisScore::Mate(-3)),
            TopMove::new("d2d4", AnalysisScore::Centipawns(-400)),
        ],
    };
    db.positions().write_evaluation(id, &outcome).await.unwrap();

    let plies = db.analytics().game_plies("g1").await.unwrap();
    assert_eq!(plies[2].candidates.len(), 2);
    assert_eq!(plies[2].evaluation(), Some(AnalysisScore::Mate(-3)));
}

// ── Analytics reads ────────────────────────────────────────────────────

#[tokio::test]
async fn test_game_plies_in_play_order() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();

    let plies = db.analytics().game_plies("g1").await.unwrap();

    let moves: Vec<&str> = plies.iter().map(|p| p.move_uci.as_str()).collect();
    assert_eq!(moves, vec!["e2e4", "e7e5", "g1f3", "b8c6"]);
    let sides: Vec<Side> = plies.iter().map(|p| p.side).collect();
    assert_eq!(sides, vec![Side::White, Side::Black, Side::White, Side::Black]);
    assert_eq!(plies[3].clock_seconds, Some(580.0));
    assert!(plies.iter().all(|p| p.depth.is_none() && p.candidates.is_empty()));
}

#[tokio::test]
async fn test_game_summary_joins_players() {
    let db = Database::new_in_memory().await.unwrap();
    db.ingest()
        .ingest(&archive_of(vec![(record("g1", "alice", "bob"), open_game("g1"))]))
        .await
        .unwrap();

    let summary = db.analytics().game_summary("g1").await.unwrap().unwrap();
    assert_eq!(summary.white, "alice");
    assert_eq!(summary.black, "bob");
    assert_eq!(summary.white_rating, Some(1500));
    assert_eq!(summary.result, GameResult::WhiteWin);
    assert_eq!(summary.eco.as_deref(), Some("C40"));

    assert!(db.analytics().game_summary("missing").await.unwrap().is_none());
}
