//! Scripted evaluators for exercising the scheduler without an engine binary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chess::{format_standard_uci, parse_fen, AnalysisScore};
use engine::{EngineError, Evaluator, EvaluatorFactory, TopMove};

/// Candidate scores handed out in order, White-relative.
const SCRIPTED_SCORES: [i32; 3] = [30, 10, -20];

#[derive(Clone, Default)]
pub(crate) struct ScriptedFactory {
    /// Time each search takes.
    pub delay: Duration,
    /// Time each evaluator takes to start.
    pub spawn_delay: Duration,
    pub fail_spawn: bool,
    /// Position keys whose search returns an error.
    pub failing: Vec<String>,
    pub spawned: Arc<AtomicUsize>,
    pub searches: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

pub(crate) struct ScriptedEvaluator {
    delay: Duration,
    failing: Vec<String>,
    searches: Arc<AtomicUsize>,
    position: Option<(String, cozy_chess::Board)>,
}

impl EvaluatorFactory for ScriptedFactory {
    type Evaluator = ScriptedEvaluator;

    async fn spawn(&self, _depth: u8) -> Result<ScriptedEvaluator, EngineError> {
        tokio::time::sleep(self.spawn_delay).await;
        if self.fail_spawn {
            return Err(EngineError::NotFound);
        }
        self.spawned.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedEvaluator {
            delay: self.delay,
            failing: self.failing.clone(),
            searches: self.searches.clone(),
            position: None,
        })
    }
}

impl Evaluator for ScriptedEvaluator {
    fn set_position(&mut self, fen: &str) -> Result<(), EngineError> {
        let board = parse_fen(fen)?;
        self.position = Some((fen.to_string(), board));
        Ok(())
    }

    async fn top_moves(&mut self, count: usize) -> Result<Vec<TopMove>, EngineError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let (fen, board) = self.position.as_ref().ok_or(EngineError::NoPosition)?;
        if self.failing.iter().any(|f| f == fen) {
            return Err(EngineError::Closed);
        }

        let mut moves = Vec::new();
        board.generate_moves(|piece_moves| {
            moves.extend(piece_moves);
            false
        });
        Ok(moves
            .into_iter()
            .take(count)
            .zip(SCRIPTED_SCORES)
            .map(|(mv, cp)| TopMove::new(format_standard_uci(board, mv), AnalysisScore::Centipawns(cp)))
            .collect())
    }

    async fn shutdown(self) {}
}
