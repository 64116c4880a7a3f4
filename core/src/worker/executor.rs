//! Load-generation worker loop

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::traits::LoadWorker;

use super::client::IngestClient;
use super::payload::{Event, PayloadGenerator};
use super::stats::WorkerStats;

/// Default number of buffered events per intake request
const DEFAULT_BATCH_SIZE: usize = 64;

/// Concrete [`LoadWorker`] generating paced transactions and errors
///
/// Generation runs until the first of: cancellation, the graceful stop
/// signal, the run timeout, or both payload caps exhausted. Stop and timeout
/// are followed by a drain of the buffered batch bounded by the flush window;
/// cancellation aborts without draining.
pub struct IngestWorker {
    client: Arc<dyn IngestClient>,
    batch_size: usize,
}

impl IngestWorker {
    /// Create a worker that delivers through `client`
    pub fn new(client: Arc<dyn IngestClient>) -> Self {
        Self {
            client,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the intake batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

fn pacing_interval(frequency: Duration) -> time::Interval {
    // interval() panics on a zero period
    let mut interval = time::interval(frequency.max(Duration::from_nanos(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[async_trait]
impl LoadWorker for IngestWorker {
    async fn run(
        &self,
        cancel: CancellationToken,
        config: &Config,
        instance_id: &str,
        mut stop: broadcast::Receiver<()>,
    ) -> Result<WorkerStats> {
        let mut stats = WorkerStats::new();
        stats.start();

        let mut generator = PayloadGenerator::new(config.instance_seed(instance_id), config);
        let mut buffer: Vec<Event> = Vec::with_capacity(self.batch_size);

        let mut transaction_ticker = pacing_interval(config.transaction_frequency);
        let mut error_ticker = pacing_interval(config.error_frequency);
        let deadline = time::sleep(config.run_timeout);
        tokio::pin!(deadline);

        let mut cancelled = false;
        loop {
            if stats.transactions >= config.transaction_limit
                && stats.errors >= config.error_limit
            {
                tracing::debug!(instance = instance_id, "payload caps exhausted");
                break;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(instance = instance_id, "cancelled");
                    cancelled = true;
                    break;
                }

                // Any resolution counts as a stop: a closed channel means the
                // controller is gone and there is nothing left to wait for.
                _ = stop.recv() => {
                    tracing::debug!(instance = instance_id, "graceful stop received");
                    break;
                }

                _ = &mut deadline => {
                    tracing::debug!(instance = instance_id, "run timeout elapsed");
                    break;
                }

                _ = transaction_ticker.tick(), if stats.transactions < config.transaction_limit => {
                    let transaction = generator.next_transaction();
                    stats.record_transaction(transaction.spans.len());
                    buffer.push(Event::Transaction(transaction));
                }

                _ = error_ticker.tick(), if stats.errors < config.error_limit => {
                    buffer.push(Event::Error(generator.next_error()));
                    stats.record_error();
                }
            }

            if buffer.len() >= self.batch_size {
                self.client
                    .send(&buffer)
                    .await
                    .map_err(|e| Error::worker(instance_id, e))?;
                buffer.clear();
            }
        }

        if cancelled {
            // Hard cancellation is non-drained; the buffered batch is discarded.
            stats.stop();
            return Ok(stats);
        }

        match time::timeout(config.flush_timeout, self.client.send(&buffer)).await {
            Ok(Ok(())) => {
                stats.stop();
                tracing::info!(
                    instance = instance_id,
                    transactions = stats.transactions,
                    spans = stats.spans,
                    errors = stats.errors,
                    "instance finished"
                );
                Ok(stats)
            }
            Ok(Err(e)) => Err(Error::worker(instance_id, e)),
            Err(_) => Err(Error::FlushTimeout(config.flush_timeout)),
        }
    }
}
