//! Shared encode/decode helpers for SQLite <-> domain type conversions.
//!
//! These bridge domain enums and the string columns used in the schema's
//! CHECK constraints.

use analysis::Candidate;
use chess::{AnalysisScore, Side};

use crate::evaluation::{EvaluationOutcome, SentinelCause};

// ── AnalysisScore ──────────────────────────────────────────────────────

/// Encode an `AnalysisScore` into `(type_str, value)` for the
/// `*_eval_type` / `*_eval` columns.
pub fn encode_score(score: &AnalysisScore) -> (&'static str, i32) {
    match score {
        AnalysisScore::Centipawns(v) => ("cp", *v),
        AnalysisScore::Mate(v) => ("mate", *v),
    }
}

pub fn decode_score(type_str: &str, value: i64) -> AnalysisScore {
    let value = value as i32;
    match type_str {
        "mate" => AnalysisScore::Mate(value),
        _ => AnalysisScore::Centipawns(value),
    }
}

// ── Side ───────────────────────────────────────────────────────────────

pub fn encode_side(side: Side) -> &'static str {
    match side {
        Side::White => "w",
        Side::Black => "b",
    }
}

pub fn decode_side(s: &str) -> Side {
    match s {
        "b" => Side::Black,
        _ => Side::White,
    }
}

// ── Evaluation status ──────────────────────────────────────────────────

pub fn encode_status(outcome: &EvaluationOutcome) -> &'static str {
    match outcome {
        EvaluationOutcome::Evaluated { .. } => "evaluated",
        EvaluationOutcome::Sentinel {
            cause: SentinelCause::TimedOut,
            ..
        } => "timed_out",
        EvaluationOutcome::Sentinel {
            cause: SentinelCause::Failed(_),
            ..
        } => "failed",
    }
}

// ── Candidate slots ────────────────────────────────────────────────────

/// One `(move, eval, eval_type)` column triple.
pub type CandidateSlot = (Option<String>, Option<i64>, Option<String>);

/// Rebuild the candidate list from the three slots, stopping at the first
/// empty one.
pub fn decode_candidates(slots: [CandidateSlot; 3]) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(3);
    for (mv, eval, eval_type) in slots {
        match (mv, eval, eval_type) {
            (Some(uci), Some(value), Some(kind)) => {
                candidates.push(Candidate::new(uci, decode_score(&kind, value)));
            }
            _ => break,
        }
    }
    candidates
}
