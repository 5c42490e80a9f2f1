use engine::TopMove;

/// Why a position got a placeholder instead of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelCause {
    /// No result arrived before the batch deadline.
    TimedOut,
    /// The evaluator reported an error for this position.
    Failed(String),
}

/// The single result recorded for a position by one batch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Evaluated {
        depth: u8,
        /// Best first, at most three.
        candidates: Vec<TopMove>,
    },
    Sentinel {
        attempted_depth: u8,
        cause: SentinelCause,
    },
}

impl EvaluationOutcome {
    pub fn timed_out(depth: u8) -> Self {
        Self::Sentinel {
            attempted_depth: depth,
            cause: SentinelCause::TimedOut,
        }
    }

    pub fn failed(depth: u8, reason: impl Into<String>) -> Self {
        Self::Sentinel {
            attempted_depth: depth,
            cause: SentinelCause::Failed(reason.into()),
        }
    }

    /// Depth written to the store for this outcome.
    pub fn depth(&self) -> u8 {
        match self {
            Self::Evaluated { depth, .. } => *depth,
            Self::Sentinel {
                attempted_depth, ..
            } => *attempted_depth,
        }
    }

    pub fn candidates(&self) -> &[TopMove] {
        match self {
            Self::Evaluated { candidates, .. } => candidates,
            Self::Sentinel { .. } => &[],
        }
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self, Self::Evaluated { .. })
    }
}

/// A position handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionJob {
    pub position_id: i64,
    pub fen: String,
}

/// Counts for one evaluation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchReport {
    pub requested: usize,
    pub evaluated: usize,
    pub timed_out: usize,
    pub failed: usize,
    /// Write-backs refused because the stored depth was already as deep.
    pub rejected_stale: usize,
}

impl BatchReport {
    pub(crate) fn record(&mut self, outcome: &EvaluationOutcome) {
        match outcome {
            EvaluationOutcome::Evaluated { .. } => self.evaluated += 1,
            EvaluationOutcome::Sentinel {
                cause: SentinelCause::TimedOut,
                ..
            } => self.timed_out += 1,
            EvaluationOutcome::Sentinel {
                cause: SentinelCause::Failed(_),
                ..
            } => self.failed += 1,
        }
    }
}
