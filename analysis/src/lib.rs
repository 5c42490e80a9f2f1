//! Move-quality analytics over the ordered plies of stored games.
//!
//! Every function here is a pure fold over [`PlyRecord`]s; plies are expected
//! grouped by game and in play order within a game.

pub mod loss;
pub mod rank;
pub mod report;
pub mod series;
pub mod types;

pub use chess::{is_white_ply, AnalysisScore};
pub use loss::{evaluation_loss, LossPoint};
pub use rank::{move_ranks, side_summaries, MoveRank, RankCounts, RankPoint, SideSummaries, SideSummary};
pub use report::{build_report, GameReport, GameSummary};
pub use series::{clock_differential, evaluation_series, ClockPoint, SeriesPoint};
pub use types::{Candidate, PlyRecord};
