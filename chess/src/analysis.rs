//! Engine evaluation score shared by the engine, store and analytics crates.

use serde::{Deserialize, Serialize};

use crate::types::Side;

/// Magnitude used for forced-mate scores when they are compared against
/// centipawn scores.
pub const MATE_SCORE_CP: i32 = 30_000;

/// Display and aggregation bound, in centipawns (10 pawns).
pub const EVAL_CLAMP_CP: i32 = 1_000;

/// Engine evaluation score.
///
/// Scores stored by this project are White-relative:
/// Centipawns: positive = White is better.
/// Mate: positive N = White mates in N moves,
/// negative N = Black mates in N moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnalysisScore {
    Centipawns(i32),
    Mate(i32),
}

impl AnalysisScore {
    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m > 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }

    /// Convert to centipawns for comparison. Mate scores map to a large
    /// magnitude that shrinks with the distance to mate, so a shorter mate
    /// always sorts above a longer one and both above any centipawn score.
    pub fn to_cp(&self) -> i32 {
        match self {
            Self::Centipawns(cp) => *cp,
            Self::Mate(m) => {
                if *m > 0 {
                    MATE_SCORE_CP - *m * 100
                } else {
                    -MATE_SCORE_CP - *m * 100
                }
            }
        }
    }

    /// [`to_cp`](Self::to_cp) bounded to +/-10 pawns. Every aggregate and
    /// every displayed series goes through this.
    pub fn clamped_cp(&self) -> i32 {
        self.to_cp().clamp(-EVAL_CLAMP_CP, EVAL_CLAMP_CP)
    }

    /// Clamped evaluation in pawns.
    pub fn pawns(&self) -> f64 {
        f64::from(self.clamped_cp()) / 100.0
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }

    /// Re-express a score reported from the side to move's perspective
    /// (as UCI engines do) as a White-relative score.
    pub fn from_side_to_move(self, side_to_move: Side) -> Self {
        match side_to_move {
            Side::White => self,
            Side::Black => self.negate(),
        }
    }
}

/// Returns true if the given 1-indexed ply belongs to White.
/// Convention: odd plies (1, 3, 5, …) are White moves; even plies (2, 4, 6, …) are Black.
pub fn is_white_ply(ply: u32) -> bool {
    ply % 2 == 1
}

impl std::fmt::Display for AnalysisScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
