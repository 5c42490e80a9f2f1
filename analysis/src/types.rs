use chess::{AnalysisScore, Side};
use serde::{Deserialize, Serialize};

/// A stored candidate move of a position, White-relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub uci: String,
    pub score: AnalysisScore,
}

impl Candidate {
    pub fn new(uci: impl Into<String>, score: AnalysisScore) -> Self {
        Self {
            uci: uci.into(),
            score,
        }
    }
}

/// One ply of a stored game joined with the evaluation of the position it
/// was played from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlyRecord {
    pub game_id: String,
    pub move_number: u32,
    pub side: Side,
    pub move_uci: String,
    pub move_san: String,
    pub clock_seconds: Option<f64>,
    pub fen: String,
    pub depth: Option<u32>,
    /// Best first; empty when the position has not been evaluated.
    pub candidates: Vec<Candidate>,
}

impl PlyRecord {
    pub fn ply_number(&self) -> u32 {
        self.side.ply_number(self.move_number)
    }

    /// Evaluation of the position: the score of its best candidate.
    pub fn evaluation(&self) -> Option<AnalysisScore> {
        self.candidates.first().map(|c| c.score)
    }
}
