use chess::Side;
use serde::{Deserialize, Serialize};

use crate::loss::{evaluation_loss, LossPoint};
use crate::types::{Candidate, PlyRecord};

/// Where the played move sits among the stored candidates of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveRank {
    Best,
    Second,
    Third,
    Other,
    /// The position has no stored candidates.
    Unevaluated,
}

/// Rank weight used for averaging; [`MoveRank::Other`] counts as 5.
const OTHER_WEIGHT: u32 = 5;

impl MoveRank {
    pub fn classify(played_uci: &str, candidates: &[Candidate]) -> Self {
        if candidates.is_empty() {
            return Self::Unevaluated;
        }
        match candidates.iter().position(|c| c.uci == played_uci) {
            Some(0) => Self::Best,
            Some(1) => Self::Second,
            Some(2) => Self::Third,
            _ => Self::Other,
        }
    }

    /// `None` for unevaluated moves, which are left out of averages.
    pub fn weight(self) -> Option<u32> {
        match self {
            Self::Best => Some(1),
            Self::Second => Some(2),
            Self::Third => Some(3),
            Self::Other => Some(OTHER_WEIGHT),
            Self::Unevaluated => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankPoint {
    pub game_id: String,
    pub ply: u32,
    pub side: Side,
    pub move_san: String,
    pub rank: MoveRank,
}

pub fn move_ranks(plies: &[PlyRecord]) -> Vec<RankPoint> {
    plies
        .iter()
        .map(|ply| RankPoint {
            game_id: ply.game_id.clone(),
            ply: ply.ply_number(),
            side: ply.side,
            move_san: ply.move_san.clone(),
            rank: MoveRank::classify(&ply.move_uci, &ply.candidates),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCounts {
    pub best: usize,
    pub second: usize,
    pub third: usize,
    pub other: usize,
    pub unevaluated: usize,
}

impl RankCounts {
    fn add(&mut self, rank: MoveRank) {
        match rank {
            MoveRank::Best => self.best += 1,
            MoveRank::Second => self.second += 1,
            MoveRank::Third => self.third += 1,
            MoveRank::Other => self.other += 1,
            MoveRank::Unevaluated => self.unevaluated += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.best + self.second + self.third + self.other + self.unevaluated
    }
}

/// Per-side move quality aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub side: Side,
    pub plies: usize,
    /// Average evaluation given away per measured move, in pawns.
    pub average_loss: Option<f64>,
    pub total_loss: f64,
    /// Average rank weight over evaluated moves.
    pub average_rank: Option<f64>,
    pub counts: RankCounts,
}

impl SideSummary {
    fn empty(side: Side) -> Self {
        Self {
            side,
            plies: 0,
            average_loss: None,
            total_loss: 0.0,
            average_rank: None,
            counts: RankCounts::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSummaries {
    pub white: SideSummary,
    pub black: SideSummary,
}

impl SideSummaries {
    pub fn get(&self, side: Side) -> &SideSummary {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    fn get_mut(&mut self, side: Side) -> &mut SideSummary {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}

/// Aggregate move ranks and evaluation loss for both sides.
pub fn side_summaries(plies: &[PlyRecord]) -> SideSummaries {
    let mut summaries = SideSummaries {
        white: SideSummary::empty(Side::White),
        black: SideSummary::empty(Side::Black),
    };

    let mut rank_sums = [(0u32, 0u32); 2];
    for point in move_ranks(plies) {
        let summary = summaries.get_mut(point.side);
        summary.plies += 1;
        summary.counts.add(point.rank);
        if let Some(weight) = point.rank.weight() {
            let slot = &mut rank_sums[side_index(point.side)];
            slot.0 += weight;
            slot.1 += 1;
        }
    }

    let mut loss_sums = [(0i64, 0u32); 2];
    for point in evaluation_loss(plies) {
        accumulate_loss(&mut loss_sums[side_index(point.mover)], &point);
    }

    for side in [Side::White, Side::Black] {
        let (rank_total, ranked) = rank_sums[side_index(side)];
        let (loss_total, measured) = loss_sums[side_index(side)];
        let summary = summaries.get_mut(side);
        summary.average_rank = (ranked > 0).then(|| f64::from(rank_total) / f64::from(ranked));
        summary.total_loss = loss_total as f64 / 100.0;
        summary.average_loss =
            (measured > 0).then(|| loss_total as f64 / 100.0 / f64::from(measured));
    }

    summaries
}

fn accumulate_loss(slot: &mut (i64, u32), point: &LossPoint) {
    if let Some(loss) = point.loss_for_mover() {
        slot.0 += i64::from(loss);
        slot.1 += 1;
    }
}

fn side_index(side: Side) -> usize {
    match side {
        Side::White => 0,
        Side::Black => 1,
    }
}
