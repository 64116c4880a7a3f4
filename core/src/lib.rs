//! hey-ingest-core: orchestration core for the hey-ingest load driver
//!
//! This crate coordinates synthetic load against a telemetry-ingestion
//! backend in two modes:
//!
//! - **Load generation**: N concurrent worker instances with staggered
//!   starts, cooperatively stopped by the first interrupt and drained within
//!   a bounded flush window.
//! - **Benchmark**: a single fixed pass whose throughput is judged against
//!   historical results; an interrupt hard-cancels the run and discards it.
//!
//! The two shutdown disciplines are selected once at startup by the
//! [`interrupt::InterruptBridge`] and never combined. Across N concurrent
//! instances at most one error is surfaced: the first failure cancels its
//! siblings, everything is still waited on, and that first error is the run
//! result.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod benchmark;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod orchestrator;
pub mod store;
pub mod traits;
pub mod worker;

pub use benchmark::Benchmark;
pub use config::{Config, ConfigBuilder, ConfigError, RunMode};
pub use error::{Error, Result};
pub use interrupt::{InterruptBridge, ShutdownMode};
pub use orchestrator::Orchestrator;
pub use store::EsMetricsStore;
pub use traits::{BenchmarkRecord, BenchmarkRunner, LoadWorker, MetricsStore};
pub use worker::{HttpIngestClient, IngestWorker, WorkerStats};
