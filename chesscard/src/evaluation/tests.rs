use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use chess::START_FEN;

use super::*;
use crate::testing::ScriptedFactory;

const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -";
const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq -";
const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq -";

fn jobs(fens: &[&str]) -> Vec<PositionJob> {
    fens.iter()
        .enumerate()
        .map(|(i, fen)| PositionJob {
            position_id: i as i64 + 1,
            fen: fen.to_string(),
        })
        .collect()
}

fn config(depth: u8, workers: usize, budget: Duration) -> SchedulerConfig {
    SchedulerConfig {
        depth,
        workers,
        budget,
    }
}

#[tokio::test]
async fn test_batch_returns_outcomes_in_input_order() {
    let scheduler = EvaluationScheduler::new(ScriptedFactory::default());
    let input = jobs(&[START_FEN, AFTER_E4, AFTER_E4_E5]);

    let outcomes = scheduler
        .evaluate_batch(input, &config(8, 2, Duration::from_secs(5)))
        .await
        .unwrap();

    let ids: Vec<i64> = outcomes.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    for (_, outcome) in &outcomes {
        assert!(outcome.is_evaluated());
        assert_eq!(outcome.depth(), 8);
        assert_eq!(outcome.candidates().len(), 3);
    }
}

#[tokio::test]
async fn test_terminal_position_has_no_candidates() {
    let scheduler = EvaluationScheduler::new(ScriptedFactory::default());
    let outcomes = scheduler
        .evaluate_batch(jobs(&[FOOLS_MATE]), &config(5, 1, Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(
        outcomes[0].1,
        EvaluationOutcome::Evaluated {
            depth: 5,
            candidates: vec![]
        }
    );
}

#[tokio::test]
async fn test_pool_is_capped_by_position_count() {
    let factory = ScriptedFactory::default();
    let spawned = factory.spawned.clone();
    let scheduler = EvaluationScheduler::new(factory);

    scheduler
        .evaluate_batch(jobs(&[START_FEN, AFTER_E4]), &config(4, 8, Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(spawned.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_empty_batch_spawns_nothing() {
    let factory = ScriptedFactory::default();
    let spawned = factory.spawned.clone();
    let scheduler = EvaluationScheduler::new(factory);

    let outcomes = scheduler
        .evaluate_batch(vec![], &config(4, 4, Duration::from_secs(1)))
        .await
        .unwrap();

    assert!(outcomes.is_empty());
    assert_eq!(spawned.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_duplicate_positions_get_one_outcome() {
    let scheduler = EvaluationScheduler::new(ScriptedFactory::default());
    let mut input = jobs(&[START_FEN, AFTER_E4]);
    input.push(input[0].clone());

    let outcomes = scheduler
        .evaluate_batch(input, &config(3, 2, Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
}

#[tokio::test]
async fn test_spawn_failure_is_fatal() {
    let factory = ScriptedFactory {
        fail_spawn: true,
        ..Default::default()
    };
    let searches = factory.searches.clone();
    let scheduler = EvaluationScheduler::new(factory);

    let err = scheduler
        .evaluate_batch(jobs(&[START_FEN, AFTER_E4]), &config(5, 2, Duration::from_secs(5)))
        .await
        .unwrap_err();

    assert!(matches!(err, SchedulerError::EvaluatorUnavailable(_)));
    assert_eq!(searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_depth_out_of_range_is_rejected() {
    let scheduler = EvaluationScheduler::new(ScriptedFactory::default());
    for depth in [0, 20] {
        let err = scheduler
            .evaluate_batch(jobs(&[START_FEN]), &config(depth, 1, Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidDepth(d) if d == depth));
    }

    let err = scheduler
        .evaluate_batch(jobs(&[START_FEN]), &config(5, 0, Duration::from_secs(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::NoWorkers));
}

#[tokio::test]
async fn test_evaluator_error_becomes_failed_sentinel() {
    let factory = ScriptedFactory {
        failing: vec![AFTER_E4.to_string()],
        ..Default::default()
    };
    let scheduler = EvaluationScheduler::new(factory);

    let outcomes = scheduler
        .evaluate_batch(
            jobs(&[START_FEN, AFTER_E4, AFTER_E4_E5]),
            &config(6, 1, Duration::from_secs(5)),
        )
        .await
        .unwrap();

    assert!(outcomes[0].1.is_evaluated());
    assert!(matches!(
        &outcomes[1].1,
        EvaluationOutcome::Sentinel {
            attempted_depth: 6,
            cause: SentinelCause::Failed(_)
        }
    ));
    assert!(outcomes[2].1.is_evaluated());
}

#[tokio::test]
async fn test_invalid_fen_becomes_failed_sentinel() {
    let scheduler = EvaluationScheduler::new(ScriptedFactory::default());
    let outcomes = scheduler
        .evaluate_batch(jobs(&["not a fen at all"]), &config(6, 1, Duration::from_secs(5)))
        .await
        .unwrap();

    assert!(matches!(
        &outcomes[0].1,
        EvaluationOutcome::Sentinel {
            cause: SentinelCause::Failed(_),
            ..
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_budget_elapsed_yields_sentinels_for_every_position() {
    let scheduler = EvaluationScheduler::new(ScriptedFactory::with_delay(Duration::from_secs(5)));
    let input = jobs(&[START_FEN, AFTER_E4, AFTER_E4_E5]);

    let started = Instant::now();
    let outcomes = scheduler
        .evaluate_batch(input, &config(12, 2, Duration::from_millis(100)))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(outcomes.len(), 3);
    for (_, outcome) in &outcomes {
        assert_eq!(outcome, &EvaluationOutcome::timed_out(12));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_partial_results_are_kept_on_timeout() {
    let factory = ScriptedFactory::with_delay(Duration::from_millis(150));
    let scheduler = EvaluationScheduler::new(factory);
    let input = jobs(&[START_FEN, AFTER_E4, AFTER_E4_E5]);

    // One worker finishes the first position well inside the budget but
    // cannot get through all three.
    let outcomes = scheduler
        .evaluate_batch(input, &config(7, 1, Duration::from_millis(250)))
        .await
        .unwrap();

    assert!(outcomes[0].1.is_evaluated());
    assert_eq!(outcomes[2].1, EvaluationOutcome::timed_out(7));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_worker_stops_pulling_work() {
    let factory = ScriptedFactory::with_delay(Duration::from_millis(200));
    let searches = factory.searches.clone();
    let scheduler = EvaluationScheduler::new(factory);

    let outcomes = scheduler
        .evaluate_batch(
            jobs(&[START_FEN, AFTER_E4, AFTER_E4_E5]),
            &config(9, 1, Duration::from_millis(50)),
        )
        .await
        .unwrap();
    assert!(outcomes.iter().all(|(_, o)| !o.is_evaluated()));

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unbounded_budget_does_not_overflow_the_deadline() {
    let scheduler = EvaluationScheduler::new(ScriptedFactory::default());

    let outcomes = scheduler
        .evaluate_batch(jobs(&[START_FEN, AFTER_E4]), &config(5, 1, Duration::MAX))
        .await
        .unwrap();

    assert!(outcomes.iter().all(|(_, o)| o.is_evaluated()));
}

#[tokio::test]
async fn test_largest_cli_budget_is_accepted() {
    let cfg = crate::config::scheduler_config(Some(5), Some(1), Some(u64::MAX)).unwrap();
    let scheduler = EvaluationScheduler::new(ScriptedFactory::default());

    let outcomes = scheduler.evaluate_batch(jobs(&[START_FEN]), &cfg).await.unwrap();

    assert!(outcomes[0].1.is_evaluated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_budget_starts_after_evaluator_startup() {
    let factory = ScriptedFactory {
        spawn_delay: Duration::from_millis(300),
        ..Default::default()
    };
    let scheduler = EvaluationScheduler::new(factory);

    // Startup alone outlasts the budget; the searches themselves fit.
    let outcomes = scheduler
        .evaluate_batch(jobs(&[START_FEN, AFTER_E4]), &config(6, 2, Duration::from_millis(200)))
        .await
        .unwrap();

    assert!(outcomes.iter().all(|(_, o)| o.is_evaluated()));
}
