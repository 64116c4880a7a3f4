//! Load-generation worker
//!
//! The worker is the unit the orchestrator fans out: a tokio task running the
//! loop **tick -> generate -> buffer -> batch-send -> repeat** until it is
//! told to stop. Payload shapes stay inside the configured limits, pacing
//! comes from two `tokio::time` intervals, and delivery goes through the
//! [`IngestClient`] trait so tests never touch the network.

mod client;
mod executor;
mod payload;
mod stats;

pub use client::{HttpIngestClient, IngestClient};
pub use executor::IngestWorker;
pub use payload::{ErrorEvent, Event, Frame, PayloadGenerator, Span, Transaction};
pub use stats::WorkerStats;
