//! hey-ingest - synthetic load and benchmark driver for telemetry backends

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use hey_ingest_core::{
    Benchmark, EsMetricsStore, HttpIngestClient, IngestWorker, InterruptBridge, Orchestrator,
    RunMode,
};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = cli::Cli::parse().into_config()?;
    tracing::info!(mode = ?config.mode, seed = config.seed, "hey-ingest starting");

    let client = Arc::new(HttpIngestClient::from_config(&config));
    let worker = Arc::new(IngestWorker::new(client));

    match config.mode {
        RunMode::Benchmark => {
            let store = Arc::new(EsMetricsStore::from_config(&config));
            let benchmark = Benchmark::new(worker.clone(), store);
            let orchestrator = Orchestrator::new(config, worker);

            // Interrupting a benchmark aborts it: a partial result is not a
            // valid basis for comparison.
            let (bridge, cancel) = InterruptBridge::hard_cancel();
            let _signal = bridge.install();

            orchestrator.run_benchmark(&benchmark, cancel).await?;
        }
        RunMode::LoadGeneration => {
            let orchestrator = Orchestrator::new(config, worker);

            // Interrupting load generation stops the workers gracefully so
            // buffered telemetry can drain.
            let (bridge, stop_tx) = InterruptBridge::graceful_stop();
            let _signal = bridge.install();

            orchestrator.run_load(stop_tx).await?;
        }
    }

    Ok(())
}
