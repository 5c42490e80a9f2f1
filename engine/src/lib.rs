pub mod stockfish;
pub mod uci;

pub use stockfish::{StockfishConfig, StockfishEvaluator, StockfishFactory};
pub use uci::{parse_uci_message, parse_uci_move, UciError, UciMessage};

use std::future::Future;

use chess::AnalysisScore;
use cozy_chess::Move;

/// Number of ranked candidates an evaluation produces.
pub const CANDIDATE_COUNT: usize = 3;

/// One ranked candidate move. Exactly one of `centipawn` / `mate` is set;
/// both are White-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopMove {
    /// Long algebraic (UCI) form, e.g. `e2e4`, `e7e8q`.
    pub uci: String,
    pub centipawn: Option<i32>,
    pub mate: Option<i32>,
}

impl TopMove {
    pub fn new(uci: impl Into<String>, score: AnalysisScore) -> Self {
        let (centipawn, mate) = match score {
            AnalysisScore::Centipawns(cp) => (Some(cp), None),
            AnalysisScore::Mate(n) => (None, Some(n)),
        };
        Self {
            uci: uci.into(),
            centipawn,
            mate,
        }
    }

    pub fn score(&self) -> Option<AnalysisScore> {
        match (self.centipawn, self.mate) {
            (_, Some(n)) => Some(AnalysisScore::Mate(n)),
            (Some(cp), None) => Some(AnalysisScore::Centipawns(cp)),
            (None, None) => None,
        }
    }
}

/// A position evaluator bound to a fixed search depth.
///
/// Implementations are owned by exactly one worker at a time and are never
/// shared.
pub trait Evaluator: Send {
    /// Set the position for the next [`top_moves`](Self::top_moves) call.
    fn set_position(&mut self, fen: &str) -> Result<(), EngineError>;

    /// Up to `count` best moves of the current position, best first.
    /// An empty list means the position has no legal moves.
    fn top_moves(
        &mut self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<TopMove>, EngineError>> + Send;

    /// Release the evaluator's resources.
    fn shutdown(self) -> impl Future<Output = ()> + Send;
}

/// Builds evaluators for a given depth.
pub trait EvaluatorFactory: Send + Sync + 'static {
    type Evaluator: Evaluator + 'static;

    fn spawn(&self, depth: u8)
        -> impl Future<Output = Result<Self::Evaluator, EngineError>> + Send;
}

/// Events received from the engine process
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Ready,
    /// `None` when the engine reports `bestmove (none)`.
    BestMove(Option<Move>),
    Info(EngineInfo),
}

/// Engine analysis information
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub seldepth: Option<u8>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<Move>, // Principal variation
    pub multipv: Option<u8>,
    pub nps: Option<u64>,
}

/// Score as reported by a UCI engine: from the side to move's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

impl From<Score> for AnalysisScore {
    fn from(score: Score) -> Self {
        match score {
            Score::Centipawns(cp) => AnalysisScore::Centipawns(cp),
            Score::Mate(n) => AnalysisScore::Mate(n),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Stockfish not found")]
    NotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Timeout waiting for {0}")]
    Timeout(&'static str),
    #[error("Engine closed its output")]
    Closed,
    #[error("No position set")]
    NoPosition,
    #[error("Invalid position: {0}")]
    InvalidPosition(#[from] chess::FenError),
    #[error("UCI error: {0}")]
    Uci(#[from] UciError),
}
