//! Per-instance statistics tracking

use std::time::Instant;

/// Statistics tracked by each load-generation instance
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Transactions generated and handed to the ingest client
    pub transactions: usize,

    /// Spans generated across all transactions
    pub spans: usize,

    /// Error events generated
    pub errors: usize,

    /// Instance start time
    pub started_at: Option<Instant>,

    /// Instance end time
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Record one generated transaction and its span count
    pub fn record_transaction(&mut self, span_count: usize) {
        self.transactions += 1;
        self.spans += span_count;
    }

    /// Record one generated error event
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Total generated events (transactions + spans + errors)
    pub fn events(&self) -> usize {
        self.transactions + self.spans + self.errors
    }

    /// Elapsed time since start
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Generated events per second over the tracked window
    pub fn events_per_second(&self) -> f64 {
        self.elapsed()
            .map(|d| {
                let secs = d.as_secs_f64();
                if secs > 0.0 {
                    self.events() as f64 / secs
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0)
    }

    /// Merge stats from another instance
    pub fn merge(&mut self, other: &WorkerStats) {
        self.transactions += other.transactions;
        self.spans += other.spans;
        self.errors += other.errors;
        self.started_at = match (self.started_at, other.started_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.ended_at = match (self.ended_at, other.ended_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}
