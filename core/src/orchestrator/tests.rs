//! Tests for the Orchestrator module

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigBuilder, RunMode};
use crate::error::{Error, Result};
use crate::traits::{BenchmarkRunner, LoadWorker};
use crate::worker::WorkerStats;

use super::executor::Orchestrator;

// ============================================================================
// Mock LoadWorker
// ============================================================================

#[derive(Clone, Copy, PartialEq)]
enum MockBehavior {
    /// Return a successful stats record immediately
    Succeed,
    /// Block until the shared cancellation token fires, then succeed
    WaitForCancel,
    /// Block until the graceful stop signal fires, then succeed
    WaitForStop,
}

struct MockWorker {
    behavior: MockBehavior,
    fail_instance: Option<String>,
    panic_instance: Option<String>,
    started: Mutex<Vec<(String, Instant)>>,
    finished: AtomicUsize,
}

impl MockWorker {
    fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            fail_instance: None,
            panic_instance: None,
            started: Mutex::new(Vec::new()),
            finished: AtomicUsize::new(0),
        }
    }

    fn with_failing_instance(mut self, id: &str) -> Self {
        self.fail_instance = Some(id.to_string());
        self
    }

    fn with_panicking_instance(mut self, id: &str) -> Self {
        self.panic_instance = Some(id.to_string());
        self
    }

    fn started_instances(&self) -> Vec<(String, Instant)> {
        self.started.lock().unwrap().clone()
    }

    fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoadWorker for MockWorker {
    async fn run(
        &self,
        cancel: CancellationToken,
        _config: &Config,
        instance_id: &str,
        mut stop: broadcast::Receiver<()>,
    ) -> Result<WorkerStats> {
        self.started
            .lock()
            .unwrap()
            .push((instance_id.to_string(), Instant::now()));

        if self.panic_instance.as_deref() == Some(instance_id) {
            panic!("simulated panic in instance {instance_id}");
        }

        if self.fail_instance.as_deref() == Some(instance_id) {
            self.finished.fetch_add(1, Ordering::SeqCst);
            return Err(Error::worker(instance_id, "simulated generation fault"));
        }

        match self.behavior {
            MockBehavior::Succeed => {}
            MockBehavior::WaitForCancel => cancel.cancelled().await,
            MockBehavior::WaitForStop => {
                let _ = stop.recv().await;
            }
        }

        self.finished.fetch_add(1, Ordering::SeqCst);
        let mut stats = WorkerStats::new();
        stats.record_transaction(2);
        Ok(stats)
    }
}

// ============================================================================
// Mock BenchmarkRunner
// ============================================================================

struct MockBenchmark {
    saw_cancelled_token: Mutex<Option<bool>>,
    verdict: Mutex<Option<Error>>,
}

impl MockBenchmark {
    fn new(verdict: Option<Error>) -> Self {
        Self {
            saw_cancelled_token: Mutex::new(None),
            verdict: Mutex::new(verdict),
        }
    }
}

#[async_trait]
impl BenchmarkRunner for MockBenchmark {
    async fn run(&self, cancel: CancellationToken, _config: &Config) -> Result<()> {
        *self.saw_cancelled_token.lock().unwrap() = Some(cancel.is_cancelled());
        match self.verdict.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn config(instances: usize, jitter: Duration) -> Config {
    ConfigBuilder::new()
        .instances(instances)
        .start_jitter(jitter)
        .seed(1234)
        .build()
        .unwrap()
}

fn stop_channel() -> broadcast::Sender<()> {
    broadcast::channel(1).0
}

// ============================================================================
// Load path
// ============================================================================

#[tokio::test]
async fn test_zero_instances_returns_immediately_without_facade_calls() {
    let worker = Arc::new(MockWorker::new(MockBehavior::Succeed));
    let orchestrator = Orchestrator::new(config(0, Duration::ZERO), worker.clone());

    orchestrator.run_load(stop_channel()).await.unwrap();

    assert!(worker.started_instances().is_empty());
}

#[tokio::test]
async fn test_all_instances_succeed() {
    let worker = Arc::new(MockWorker::new(MockBehavior::Succeed));
    let orchestrator = Orchestrator::new(config(4, Duration::ZERO), worker.clone());

    orchestrator.run_load(stop_channel()).await.unwrap();

    assert_eq!(worker.started_instances().len(), 4);
    assert_eq!(worker.finished_count(), 4);
}

#[tokio::test]
async fn test_first_failure_wins_and_all_instances_drain() {
    // Instance 1 fails immediately; its siblings only return once the shared
    // token is cancelled, which the failure must trigger.
    let worker = Arc::new(
        MockWorker::new(MockBehavior::WaitForCancel).with_failing_instance("1"),
    );
    let orchestrator = Orchestrator::new(config(4, Duration::ZERO), worker.clone());

    let result = orchestrator.run_load(stop_channel()).await;

    match result {
        Err(Error::Worker { instance, .. }) => assert_eq!(instance, "1"),
        other => panic!("expected worker failure, got {other:?}"),
    }
    // Every sibling terminated before run_load returned.
    assert_eq!(worker.finished_count(), 4);
}

#[tokio::test]
async fn test_panicked_instance_counts_as_failure() {
    let worker = Arc::new(
        MockWorker::new(MockBehavior::WaitForCancel).with_panicking_instance("0"),
    );
    let orchestrator = Orchestrator::new(config(2, Duration::ZERO), worker.clone());

    let result = orchestrator.run_load(stop_channel()).await;
    assert!(matches!(result, Err(Error::Worker { .. })));
}

#[tokio::test]
async fn test_graceful_stop_lets_instances_finish_cleanly() {
    let worker = Arc::new(MockWorker::new(MockBehavior::WaitForStop));
    let orchestrator = Orchestrator::new(config(3, Duration::ZERO), worker.clone());
    let stop_tx = stop_channel();

    let run = {
        let stop_tx = stop_tx.clone();
        tokio::spawn(async move { orchestrator.run_load(stop_tx).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();

    run.await.unwrap().unwrap();
    assert_eq!(worker.finished_count(), 3);
}

#[tokio::test]
async fn test_instances_start_within_jitter_bound() {
    let bound = Duration::from_millis(100);
    let worker = Arc::new(MockWorker::new(MockBehavior::Succeed));
    let orchestrator = Orchestrator::new(config(3, bound), worker.clone());

    let run_start = Instant::now();
    orchestrator.run_load(stop_channel()).await.unwrap();

    // Generous slack for scheduling; the property under test is that no
    // instance waits past the bound before calling the facade.
    for (_, started_at) in worker.started_instances() {
        assert!(started_at.duration_since(run_start) < bound + Duration::from_millis(200));
    }
}

// ============================================================================
// Jitter schedule
// ============================================================================

#[tokio::test]
async fn test_jitter_schedule_respects_bound() {
    let bound = Duration::from_millis(250);
    let worker = Arc::new(MockWorker::new(MockBehavior::Succeed));
    let orchestrator = Orchestrator::new(config(16, bound), worker);

    let schedule = orchestrator.jitter_schedule();
    assert_eq!(schedule.len(), 16);
    for jitter in schedule {
        assert!(jitter < bound);
    }
}

#[tokio::test]
async fn test_jitter_schedule_zero_bound_means_no_delay() {
    let worker = Arc::new(MockWorker::new(MockBehavior::Succeed));
    let orchestrator = Orchestrator::new(config(4, Duration::ZERO), worker);

    assert!(orchestrator
        .jitter_schedule()
        .iter()
        .all(|j| *j == Duration::ZERO));
}

#[tokio::test]
async fn test_jitter_schedule_reproducible_for_same_seed() {
    let worker = Arc::new(MockWorker::new(MockBehavior::Succeed));
    let a = Orchestrator::new(config(8, Duration::from_millis(1000)), worker.clone());
    let b = Orchestrator::new(config(8, Duration::from_millis(1000)), worker.clone());

    assert_eq!(a.jitter_schedule(), b.jitter_schedule());

    let other_seed = ConfigBuilder::new()
        .instances(8)
        .start_jitter(Duration::from_millis(1000))
        .seed(4321)
        .build()
        .unwrap();
    let c = Orchestrator::new(other_seed, worker);
    assert_ne!(a.jitter_schedule(), c.jitter_schedule());
}

// ============================================================================
// Benchmark path
// ============================================================================

#[tokio::test]
async fn test_benchmark_delegation_passes_token_and_surfaces_verdict() {
    let worker = Arc::new(MockWorker::new(MockBehavior::Succeed));
    let config = ConfigBuilder::new()
        .mode(RunMode::Benchmark)
        .seed(1)
        .build()
        .unwrap();
    let orchestrator = Orchestrator::new(config, worker);

    let benchmark = MockBenchmark::new(Some(Error::Regression {
        current: 900.0,
        baseline: 1100.0,
        margin: 1.1,
    }));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = orchestrator.run_benchmark(&benchmark, cancel).await;

    assert!(matches!(result, Err(Error::Regression { .. })));
    // The facade received the orchestrator's token, not a fresh one.
    assert_eq!(*benchmark.saw_cancelled_token.lock().unwrap(), Some(true));
}

#[tokio::test]
async fn test_benchmark_success_passes_through() {
    let worker = Arc::new(MockWorker::new(MockBehavior::Succeed));
    let config = ConfigBuilder::new()
        .mode(RunMode::Benchmark)
        .seed(1)
        .build()
        .unwrap();
    let orchestrator = Orchestrator::new(config, worker);

    let benchmark = MockBenchmark::new(None);
    orchestrator
        .run_benchmark(&benchmark, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(*benchmark.saw_cancelled_token.lock().unwrap(), Some(false));
}
