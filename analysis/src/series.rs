use chess::{material_balance, Side};
use serde::{Deserialize, Serialize};

use crate::types::PlyRecord;

/// Evaluation and material at one ply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub game_id: String,
    pub ply: u32,
    pub side: Side,
    pub move_san: String,
    /// Pawns, clamped to +/-10. Forward-filled; `None` until the game's
    /// first evaluated ply.
    pub evaluation: Option<f64>,
    /// Pawns, White positive.
    pub material: i32,
}

/// Per-ply evaluation and material balance, one point per ply.
pub fn evaluation_series(plies: &[PlyRecord]) -> Vec<SeriesPoint> {
    let mut points = Vec::with_capacity(plies.len());
    let mut current_game: Option<&str> = None;
    let mut last_eval: Option<f64> = None;

    for ply in plies {
        if current_game != Some(ply.game_id.as_str()) {
            current_game = Some(ply.game_id.as_str());
            last_eval = None;
        }
        if let Some(score) = ply.evaluation() {
            last_eval = Some(score.pawns());
        }
        points.push(SeriesPoint {
            game_id: ply.game_id.clone(),
            ply: ply.ply_number(),
            side: ply.side,
            move_san: ply.move_san.clone(),
            evaluation: last_eval,
            material: material_balance(&ply.fen),
        });
    }

    points
}

/// Clocks of both players after one full move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockPoint {
    pub game_id: String,
    pub move_number: u32,
    pub white_seconds: f64,
    pub black_seconds: f64,
    /// White's clock minus Black's clock.
    pub differential: f64,
}

/// Clock differential per full move. Moves where either side has no clock
/// reading are skipped.
pub fn clock_differential(plies: &[PlyRecord]) -> Vec<ClockPoint> {
    let mut points = Vec::new();
    let mut pending_white: Option<(&str, u32, f64)> = None;

    for ply in plies {
        match (ply.side, ply.clock_seconds) {
            (Side::White, Some(clock)) => {
                pending_white = Some((ply.game_id.as_str(), ply.move_number, clock));
            }
            (Side::White, None) => pending_white = None,
            (Side::Black, Some(black)) => {
                if let Some((game_id, move_number, white)) = pending_white.take() {
                    if game_id == ply.game_id && move_number == ply.move_number {
                        points.push(ClockPoint {
                            game_id: game_id.to_string(),
                            move_number,
                            white_seconds: white,
                            black_seconds: black,
                            differential: white - black,
                        });
                    }
                }
            }
            (Side::Black, None) => pending_white = None,
        }
    }

    points
}
