//! Orchestrator execution logic

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::traits::{BenchmarkRunner, LoadWorker};
use crate::worker::WorkerStats;

/// Top-level run control
///
/// Fans the configured number of worker instances out as tokio tasks in
/// load-generation mode, or hands the entire run to a benchmark facade in
/// benchmark mode. Aggregates all outcomes into a single result: the first
/// failing instance wins and everything else is still drained.
pub struct Orchestrator {
    config: Config,
    worker: Arc<dyn LoadWorker>,
}

impl Orchestrator {
    /// Create an orchestrator driving `worker` under `config`
    pub fn new(config: Config, worker: Arc<dyn LoadWorker>) -> Self {
        Self { config, worker }
    }

    /// The configuration this orchestrator runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Draw every instance's start delay up front, in instance-index order
    ///
    /// Drawing from one seeded generator before spawning keeps the sequence
    /// deterministic for a given seed; concurrent draws inside the tasks
    /// would not have a stable order.
    pub(crate) fn jitter_schedule(&self) -> Vec<Duration> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let bound_millis = self.config.start_jitter.as_millis() as u64;
        (0..self.config.instances)
            .map(|_| {
                if bound_millis == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rng.gen_range(0..bound_millis))
                }
            })
            .collect()
    }

    /// Run load generation across `instances` concurrent worker tasks
    ///
    /// `stop_tx` is the graceful-stop signal wired to the interrupt bridge;
    /// every instance subscribes before the run starts. Returns the first
    /// instance failure, after all instances have terminated.
    pub async fn run_load(&self, stop_tx: broadcast::Sender<()>) -> Result<()> {
        if self.config.instances == 0 {
            tracing::info!("no instances requested, nothing to run");
            return Ok(());
        }

        tracing::info!(
            instances = self.config.instances,
            run_timeout = ?self.config.run_timeout,
            jitter_bound = ?self.config.start_jitter,
            seed = self.config.seed,
            "starting load generation"
        );

        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for (index, jitter) in self.jitter_schedule().into_iter().enumerate() {
            let worker = Arc::clone(&self.worker);
            let config = self.config.clone();
            let cancel = cancel.clone();
            let stop = stop_tx.subscribe();

            tasks.spawn(async move {
                let instance_id = index.to_string();
                tracing::info!(
                    instance = %instance_id,
                    delay_ms = jitter.as_millis() as u64,
                    "starting instance"
                );
                tokio::time::sleep(jitter).await;
                worker.run(cancel, &config, &instance_id, stop).await
            });
        }

        let mut first_error: Option<Error> = None;
        let mut aggregate = WorkerStats::new();

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|join_error| {
                Err(Error::worker("unknown", format!("task panicked: {join_error}")))
            });
            match outcome {
                Ok(stats) => aggregate.merge(&stats),
                Err(e) => {
                    if first_error.is_none() {
                        tracing::error!(error = %e, "instance failed, cancelling siblings");
                        cancel.cancel();
                        first_error = Some(e);
                    } else {
                        tracing::debug!(error = %e, "subsequent instance failure suppressed");
                    }
                }
            }
        }

        tracing::info!(
            transactions = aggregate.transactions,
            spans = aggregate.spans,
            errors = aggregate.errors,
            events_per_second = aggregate.events_per_second(),
            "load generation finished"
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run a single benchmark pass
    ///
    /// The whole run is delegated to the facade; `cancel` is the hard-cancel
    /// token wired to the interrupt bridge. No jitter, no fan-out, so
    /// repeated invocations with one seed are comparable.
    pub async fn run_benchmark(
        &self,
        benchmark: &dyn BenchmarkRunner,
        cancel: CancellationToken,
    ) -> Result<()> {
        tracing::info!(seed = self.config.seed, "starting benchmark run");
        benchmark.run(cancel, &self.config).await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("instances", &self.config.instances)
            .field("mode", &self.config.mode)
            .finish()
    }
}
