use chess::GameResult;
use serde::{Deserialize, Serialize};

use crate::loss::{evaluation_loss, LossPoint};
use crate::rank::{move_ranks, side_summaries, RankPoint, SideSummaries};
use crate::series::{clock_differential, evaluation_series, ClockPoint, SeriesPoint};
use crate::types::PlyRecord;

/// Header data shown alongside a game's charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_id: String,
    pub white: String,
    pub black: String,
    pub white_rating: Option<i32>,
    pub black_rating: Option<i32>,
    pub result: GameResult,
    pub occurred_at: Option<String>,
    pub eco: Option<String>,
    pub time_control: Option<String>,
}

impl GameSummary {
    /// One-line description, e.g. `alice (1510) vs bob (1498), 1-0, 2021-03-04, C20`.
    pub fn headline(&self) -> String {
        let player = |name: &str, rating: Option<i32>| match rating {
            Some(r) => format!("{name} ({r})"),
            None => name.to_string(),
        };
        let mut line = format!(
            "{} vs {}, {}",
            player(&self.white, self.white_rating),
            player(&self.black, self.black_rating),
            self.result.as_pgn()
        );
        if let Some(date) = self.occurred_at.as_deref().and_then(|d| d.split(' ').next()) {
            line.push_str(", ");
            line.push_str(date);
        }
        if let Some(eco) = &self.eco {
            line.push_str(", ");
            line.push_str(eco);
        }
        line
    }
}

/// Everything a renderer needs for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    pub summary: GameSummary,
    pub headline: String,
    pub evaluation: Vec<SeriesPoint>,
    pub clock: Vec<ClockPoint>,
    pub loss: Vec<LossPoint>,
    pub ranks: Vec<RankPoint>,
    pub sides: SideSummaries,
}

pub fn build_report(summary: GameSummary, plies: &[PlyRecord]) -> GameReport {
    GameReport {
        headline: summary.headline(),
        summary,
        evaluation: evaluation_series(plies),
        clock: clock_differential(plies),
        loss: evaluation_loss(plies),
        ranks: move_ranks(plies),
        sides: side_summaries(plies),
    }
}
