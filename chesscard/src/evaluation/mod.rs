//! Position evaluation scheduler.
//!
//! A batch call builds a fixed pool of `min(workers, positions)` evaluators,
//! feeds the positions through a shared job queue and collects results over
//! a channel until every position is done or the wall-clock budget runs out.
//! Every position gets exactly one [`EvaluationOutcome`]: positions without
//! a result by the deadline get a timed-out sentinel.

pub mod types;
pub mod worker;

pub use types::{BatchReport, EvaluationOutcome, PositionJob, SentinelCause};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use engine::{Evaluator, EvaluatorFactory};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::persistence::{PersistenceError, PositionRepository};

/// Deepest search accepted by the scheduler.
pub const MAX_DEPTH: u8 = 19;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub depth: u8,
    pub workers: usize,
    /// Wall-clock budget for one batch, measured from dispatch. Evaluator
    /// startup happens before the clock starts and is bounded separately by
    /// the evaluator's own init timeout. A budget too large to represent as
    /// a deadline means no deadline.
    pub budget: Duration,
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !(1..=MAX_DEPTH).contains(&self.depth) {
            return Err(SchedulerError::InvalidDepth(self.depth));
        }
        if self.workers == 0 {
            return Err(SchedulerError::NoWorkers);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Depth {0} is outside 1..={MAX_DEPTH}")]
    InvalidDepth(u8),
    #[error("At least one worker is required")]
    NoWorkers,
    #[error("Evaluator unavailable: {0}")]
    EvaluatorUnavailable(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

pub struct EvaluationScheduler<F: EvaluatorFactory> {
    factory: Arc<F>,
}

impl<F: EvaluatorFactory> EvaluationScheduler<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Evaluate `positions` and return one outcome per distinct position, in
    /// input order. Nothing is written to the store.
    pub async fn evaluate_batch(
        &self,
        positions: Vec<PositionJob>,
        config: &SchedulerConfig,
    ) -> Result<Vec<(i64, EvaluationOutcome)>, SchedulerError> {
        config.validate()?;

        let mut seen = HashSet::new();
        let positions: Vec<PositionJob> = positions
            .into_iter()
            .filter(|job| seen.insert(job.position_id))
            .collect();
        if positions.is_empty() {
            return Ok(Vec::new());
        }

        let depth = config.depth;
        let pool_size = config.workers.min(positions.len());
        let evaluators = self.spawn_evaluators(pool_size, depth).await?;

        let (job_tx, job_rx) = mpsc::channel::<PositionJob>(positions.len());
        for job in &positions {
            if job_tx.send(job.clone()).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        // Wrap the receiver so multiple workers can share it.
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel(positions.len());

        let deadline = Instant::now().checked_add(config.budget);
        for (worker_id, evaluator) in evaluators.into_iter().enumerate() {
            tokio::spawn(worker::run_evaluation_worker(
                worker_id,
                evaluator,
                job_rx.clone(),
                result_tx.clone(),
                depth,
            ));
        }
        drop(result_tx);

        tracing::info!(
            positions = positions.len(),
            workers = pool_size,
            depth,
            budget_secs = config.budget.as_secs_f64(),
            "Evaluation batch dispatched"
        );

        let mut results: HashMap<i64, EvaluationOutcome> = HashMap::with_capacity(positions.len());
        while results.len() < positions.len() {
            let next = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, result_rx.recv()).await,
                None => Ok(result_rx.recv().await),
            };
            match next {
                Ok(Some((position_id, outcome))) => {
                    results.insert(position_id, outcome);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        completed = results.len(),
                        pending = positions.len() - results.len(),
                        "Evaluation budget elapsed"
                    );
                    break;
                }
            }
        }
        // Closing the result channel tells stragglers to stop pulling work.
        drop(result_rx);

        Ok(positions
            .into_iter()
            .map(|job| {
                let outcome = results
                    .remove(&job.position_id)
                    .unwrap_or_else(|| EvaluationOutcome::timed_out(depth));
                (job.position_id, outcome)
            })
            .collect())
    }

    /// Build every evaluator before any work is dispatched. One failure
    /// aborts the batch; evaluators already built are shut down.
    async fn spawn_evaluators(
        &self,
        count: usize,
        depth: u8,
    ) -> Result<Vec<F::Evaluator>, SchedulerError> {
        let mut set = JoinSet::new();
        for _ in 0..count {
            let factory = self.factory.clone();
            set.spawn(async move { factory.spawn(depth).await });
        }

        let mut evaluators = Vec::with_capacity(count);
        let mut failure = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(evaluator)) => evaluators.push(evaluator),
                Ok(Err(e)) => {
                    failure.get_or_insert_with(|| e.to_string());
                }
                Err(e) => {
                    failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Some(reason) = failure {
            tracing::error!(%reason, "Failed to construct evaluator");
            for evaluator in evaluators {
                evaluator.shutdown().await;
            }
            return Err(SchedulerError::EvaluatorUnavailable(reason));
        }
        Ok(evaluators)
    }

    /// Evaluate the positions of one game that are below the target depth
    /// and write the results back.
    pub async fn evaluate_game<P: PositionRepository>(
        &self,
        store: &P,
        game_id: &str,
        config: &SchedulerConfig,
    ) -> Result<BatchReport, SchedulerError> {
        config.validate()?;
        let jobs = store.positions_for_game(game_id, config.depth).await?;
        tracing::info!(game_id, positions = jobs.len(), "Evaluating game");
        self.evaluate_and_write(store, jobs, config).await
    }

    /// Evaluate up to `n` under-evaluated positions, those of `prefer_game`
    /// first, and write the results back.
    pub async fn evaluate_next_n<P: PositionRepository>(
        &self,
        store: &P,
        n: usize,
        prefer_game: Option<&str>,
        config: &SchedulerConfig,
    ) -> Result<BatchReport, SchedulerError> {
        config.validate()?;
        let jobs = store
            .select_unevaluated(n, config.depth, prefer_game)
            .await?;
        self.evaluate_and_write(store, jobs, config).await
    }

    async fn evaluate_and_write<P: PositionRepository>(
        &self,
        store: &P,
        jobs: Vec<PositionJob>,
        config: &SchedulerConfig,
    ) -> Result<BatchReport, SchedulerError> {
        let mut report = BatchReport {
            requested: jobs.len(),
            ..Default::default()
        };

        for (position_id, outcome) in self.evaluate_batch(jobs, config).await? {
            report.record(&outcome);
            if !store.write_evaluation(position_id, &outcome).await? {
                report.rejected_stale += 1;
            }
        }

        tracing::info!(
            requested = report.requested,
            evaluated = report.evaluated,
            timed_out = report.timed_out,
            failed = report.failed,
            rejected_stale = report.rejected_stale,
            "Evaluation batch written"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests;
