//! Orchestrator for run lifecycle management
//!
//! The orchestrator owns the fan-out/join pattern of the load path:
//! - spawning one worker task per instance, staggered by seeded jitter
//! - cancelling every sibling as soon as the first instance fails
//! - waiting for all instances before surfacing the single aggregate error
//!
//! and the pass-through of the benchmark path, where the whole run belongs to
//! the benchmark facade and the orchestrator only wires the hard-cancel token.

mod executor;

pub use executor::Orchestrator;

#[cfg(test)]
mod tests;
