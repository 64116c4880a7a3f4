//! Benchmark facade
//!
//! One fixed load pass whose throughput is judged against comparable
//! historical results. The verdict is part of the run result: a metric worse
//! than the best historical baseline by more than the configured margin is a
//! regression and fails the run. The new result is recorded either way, so
//! future runs compare against an up-to-date history. An interrupted run is
//! inconclusive: nothing is recorded and [`Error::Aborted`] is returned.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::traits::{BenchmarkRecord, BenchmarkRunner, LoadWorker, MetricsStore};

/// Concrete [`BenchmarkRunner`] backed by a worker and a metrics store
pub struct Benchmark {
    worker: Arc<dyn LoadWorker>,
    store: Arc<dyn MetricsStore>,
}

impl Benchmark {
    /// Create a benchmark facade
    pub fn new(worker: Arc<dyn LoadWorker>, store: Arc<dyn MetricsStore>) -> Self {
        Self { worker, store }
    }
}

#[async_trait]
impl BenchmarkRunner for Benchmark {
    async fn run(&self, cancel: CancellationToken, config: &Config) -> Result<()> {
        // The graceful-stop channel is never fired in benchmark mode; the
        // sender is held open so the worker only reacts to cancel or timeout.
        let (stop_tx, stop_rx) = broadcast::channel(1);

        let stats = self.worker.run(cancel.clone(), config, "bench", stop_rx).await?;
        drop(stop_tx);

        if cancel.is_cancelled() {
            // A partial run is not a valid baseline.
            return Err(Error::Aborted);
        }

        let current = stats.events_per_second();
        tracing::info!(
            events = stats.events(),
            events_per_second = current,
            "benchmark pass complete"
        );

        let history = self
            .store
            .recent(&config.service_name, config.regression_days)
            .await?;

        let record = BenchmarkRecord {
            service_name: config.service_name.clone(),
            timestamp: Utc::now(),
            events_per_second: current,
            seed: config.seed,
        };
        self.store.record(&record).await?;

        let baseline = history
            .iter()
            .map(|r| r.events_per_second)
            .max_by(|a, b| a.total_cmp(b));

        match baseline {
            Some(baseline) if baseline > current * config.regression_margin => {
                Err(Error::Regression {
                    current,
                    baseline,
                    margin: config.regression_margin,
                })
            }
            Some(baseline) => {
                tracing::info!(
                    baseline_events_per_second = baseline,
                    "no regression against baseline"
                );
                Ok(())
            }
            None => {
                tracing::info!(
                    lookback_days = config.regression_days,
                    "no comparable history, recording first baseline"
                );
                Ok(())
            }
        }
    }
}
