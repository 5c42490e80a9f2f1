use std::sync::Arc;

use engine::{Evaluator, CANDIDATE_COUNT};
use tokio::sync::{mpsc, Mutex};

use super::types::{EvaluationOutcome, PositionJob};

/// A worker unit. Owns one evaluator for the whole batch, pulls positions
/// from the shared queue and evaluates them one at a time.
///
/// Stops when the queue is drained or when the collector has gone away
/// (deadline passed); in both cases the evaluator is shut down on exit.
pub async fn run_evaluation_worker<E: Evaluator>(
    worker_id: usize,
    mut evaluator: E,
    job_rx: Arc<Mutex<mpsc::Receiver<PositionJob>>>,
    result_tx: mpsc::Sender<(i64, EvaluationOutcome)>,
    depth: u8,
) {
    tracing::debug!(worker_id, depth, "Evaluation worker started");
    let mut evaluated = 0usize;

    loop {
        if result_tx.is_closed() {
            tracing::debug!(worker_id, "Collector gone, worker stops pulling work");
            break;
        }

        // Only one worker picks up each job.
        let job = {
            let mut rx = job_rx.lock().await;
            match rx.recv().await {
                Some(job) => job,
                None => break,
            }
        };

        let outcome = evaluate_position(&mut evaluator, &job.fen, depth).await;
        if let EvaluationOutcome::Sentinel { cause, .. } = &outcome {
            tracing::warn!(worker_id, position_id = job.position_id, ?cause, "Evaluation failed");
        }
        evaluated += 1;

        if result_tx.send((job.position_id, outcome)).await.is_err() {
            tracing::debug!(
                worker_id,
                position_id = job.position_id,
                "Result discarded after deadline"
            );
            break;
        }
    }

    evaluator.shutdown().await;
    tracing::debug!(worker_id, evaluated, "Evaluation worker exiting");
}

async fn evaluate_position<E: Evaluator>(evaluator: &mut E, fen: &str, depth: u8) -> EvaluationOutcome {
    if let Err(e) = evaluator.set_position(fen) {
        return EvaluationOutcome::failed(depth, e.to_string());
    }
    match evaluator.top_moves(CANDIDATE_COUNT).await {
        Ok(mut candidates) => {
            candidates.truncate(CANDIDATE_COUNT);
            EvaluationOutcome::Evaluated { depth, candidates }
        }
        Err(e) => EvaluationOutcome::failed(depth, e.to_string()),
    }
}
