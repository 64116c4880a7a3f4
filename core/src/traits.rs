//! Facade traits at the orchestration boundary
//!
//! The orchestrator drives load generation and benchmarking exclusively
//! through these traits, so tests swap the real implementations for mocks and
//! the binary wires the concrete ones from [`crate::worker`] and
//! [`crate::benchmark`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::worker::WorkerStats;

/// A single load-generation instance
///
/// Implementations must terminate on the first of: `cancel` cancelled, `stop`
/// fired, or `config.run_timeout` elapsed, then attempt to flush buffered
/// output within `config.flush_timeout`. Payload-shape limits in `config` are
/// bounds, not targets.
#[async_trait]
pub trait LoadWorker: Send + Sync {
    /// Generate load until told to stop, returning the instance's statistics
    async fn run(
        &self,
        cancel: CancellationToken,
        config: &Config,
        instance_id: &str,
        stop: broadcast::Receiver<()>,
    ) -> Result<WorkerStats>;
}

/// One fixed benchmark pass including the regression verdict
#[async_trait]
pub trait BenchmarkRunner: Send + Sync {
    /// Execute the run; an `Err` is either a detected regression, an abort, or
    /// an infrastructure failure
    async fn run(&self, cancel: CancellationToken, config: &Config) -> Result<()>;
}

/// One recorded benchmark outcome in the analytics store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Service name the load was generated as
    pub service_name: String,
    /// When the run finished
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Throughput metric for the run
    pub events_per_second: f64,
    /// Seed the run was driven by
    pub seed: u64,
}

/// History access for benchmark results
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Fetch comparable records from the last `days` days
    async fn recent(&self, service_name: &str, days: u32) -> Result<Vec<BenchmarkRecord>>;

    /// Append the current run's record so future runs have an updated baseline
    async fn record(&self, record: &BenchmarkRecord) -> Result<()>;
}
