//! Synthetic payload generation
//!
//! Payload shapes (span count per transaction, frame count per error, fake
//! durations) come from a per-instance `StdRng`, so a fixed seed reproduces
//! the same stream of payloads. The configured limits are bounds the
//! generator stays within, not targets it tries to hit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::Config;

/// A span inside a generated transaction
#[derive(Debug, Clone, Serialize)]
pub struct Span {
    /// Span id, 8 random bytes hex encoded
    pub id: String,
    /// Span name
    pub name: String,
    /// Synthetic duration in milliseconds
    pub duration_ms: f64,
}

/// A generated transaction with its spans
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    /// Transaction id, 8 random bytes hex encoded
    pub id: String,
    /// Transaction name
    pub name: String,
    /// Synthetic duration in milliseconds
    pub duration_ms: f64,
    /// Child spans
    pub spans: Vec<Span>,
}

/// One frame of a generated error's stacktrace
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    /// Function name
    pub function: String,
    /// Line number
    pub line: u32,
}

/// A generated error event
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    /// Error id, 8 random bytes hex encoded
    pub id: String,
    /// Synthetic culprit
    pub culprit: String,
    /// Stacktrace frames
    pub frames: Vec<Frame>,
}

/// A single intake event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    /// A transaction (spans inlined)
    Transaction(Transaction),
    /// An error
    Error(ErrorEvent),
}

impl Event {
    /// Number of events this entry expands to on the wire (spans count too)
    pub fn wire_events(&self) -> usize {
        match self {
            Event::Transaction(t) => 1 + t.spans.len(),
            Event::Error(_) => 1,
        }
    }
}

/// Seeded source of synthetic transactions and errors
#[derive(Debug)]
pub struct PayloadGenerator {
    rng: StdRng,
    span_min: usize,
    span_max: usize,
    frame_min: usize,
    frame_max: usize,
}

impl PayloadGenerator {
    /// Build a generator from the validated shape limits in `config`
    pub fn new(seed: u64, config: &Config) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            span_min: config.span_min,
            span_max: config.span_max,
            frame_min: config.error_frame_min,
            frame_max: config.error_frame_max,
        }
    }

    fn hex_id(&mut self) -> String {
        format!("{:016x}", self.rng.gen::<u64>())
    }

    /// Generate the next transaction with a span count in `[span_min, span_max]`
    pub fn next_transaction(&mut self) -> Transaction {
        let span_count = self.rng.gen_range(self.span_min..=self.span_max);
        let spans = (0..span_count)
            .map(|i| Span {
                id: self.hex_id(),
                name: format!("SELECT FROM table_{i}"),
                duration_ms: self.rng.gen_range(0.1..50.0),
            })
            .collect();
        Transaction {
            id: self.hex_id(),
            name: format!("GET /api/resource/{}", self.rng.gen_range(0u32..100)),
            duration_ms: self.rng.gen_range(1.0..500.0),
            spans,
        }
    }

    /// Generate the next error with a frame count in `[frame_min, frame_max]`
    pub fn next_error(&mut self) -> ErrorEvent {
        let frame_count = self.rng.gen_range(self.frame_min..=self.frame_max);
        let frames = (0..frame_count)
            .map(|i| Frame {
                function: format!("handler_{i}"),
                line: self.rng.gen_range(1..2000),
            })
            .collect();
        ErrorEvent {
            id: self.hex_id(),
            culprit: format!("worker_{}", self.rng.gen_range(0u32..10)),
            frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn config(span_min: usize, span_max: usize) -> Config {
        ConfigBuilder::new()
            .spans(span_min, span_max)
            .error_frames(2, 6)
            .seed(99)
            .build()
            .unwrap()
    }

    #[test]
    fn test_span_counts_stay_within_bounds() {
        let config = config(2, 7);
        let mut gen = PayloadGenerator::new(1, &config);
        for _ in 0..200 {
            let txn = gen.next_transaction();
            assert!(txn.spans.len() >= 2 && txn.spans.len() <= 7);
        }
    }

    #[test]
    fn test_frame_counts_stay_within_bounds() {
        let config = config(1, 1);
        let mut gen = PayloadGenerator::new(1, &config);
        for _ in 0..200 {
            let err = gen.next_error();
            assert!(err.frames.len() >= 2 && err.frames.len() <= 6);
        }
    }

    #[test]
    fn test_degenerate_span_range_is_exact() {
        let config = config(4, 4);
        let mut gen = PayloadGenerator::new(1, &config);
        for _ in 0..20 {
            assert_eq!(gen.next_transaction().spans.len(), 4);
        }
    }

    #[test]
    fn test_same_seed_reproduces_payloads() {
        let config = config(1, 10);
        let mut a = PayloadGenerator::new(7, &config);
        let mut b = PayloadGenerator::new(7, &config);
        for _ in 0..50 {
            let ta = a.next_transaction();
            let tb = b.next_transaction();
            assert_eq!(ta.id, tb.id);
            assert_eq!(ta.spans.len(), tb.spans.len());
        }
    }

    #[test]
    fn test_wire_events_counts_spans() {
        let config = config(3, 3);
        let mut gen = PayloadGenerator::new(1, &config);
        let event = Event::Transaction(gen.next_transaction());
        assert_eq!(event.wire_events(), 4);
        let event = Event::Error(gen.next_error());
        assert_eq!(event.wire_events(), 1);
    }
}
