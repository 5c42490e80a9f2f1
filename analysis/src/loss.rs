use chess::Side;
use serde::{Deserialize, Serialize};

use crate::types::PlyRecord;

/// Evaluation change between the position of one ply and the position of
/// the ply before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossPoint {
    pub game_id: String,
    pub ply: u32,
    /// The side whose move produced the change (the previous ply's mover).
    pub mover: Side,
    /// White-relative, clamped centipawns. `None` on a game's first ply or
    /// when either evaluation is missing.
    pub delta_cp: Option<i32>,
}

impl LossPoint {
    /// Evaluation given away by the mover, in centipawns; gains count as 0.
    pub fn loss_for_mover(&self) -> Option<i32> {
        self.delta_cp.map(|delta| (-delta * self.mover.sign()).max(0))
    }
}

/// Lag fold over plies grouped by game.
///
/// Plies carry the position they are played from, so each point measures
/// the previous ply's move. The final move of a game has no resulting
/// position in the store and therefore no point; it is absent from any
/// loss totals built on this series.
pub fn evaluation_loss(plies: &[PlyRecord]) -> Vec<LossPoint> {
    let mut points = Vec::with_capacity(plies.len());
    let mut previous: Option<&PlyRecord> = None;

    for ply in plies {
        let prev = previous.filter(|p| p.game_id == ply.game_id);
        let delta_cp = prev.and_then(|p| {
            let before = p.evaluation()?.clamped_cp();
            let after = ply.evaluation()?.clamped_cp();
            Some(after - before)
        });
        points.push(LossPoint {
            game_id: ply.game_id.clone(),
            ply: ply.ply_number(),
            mover: prev.map_or(ply.side.opposite(), |p| p.side),
            delta_cp,
        });
        previous = Some(ply);
    }

    points
}
