//! Error types for hey-ingest-core

use std::time::Duration;

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration rejected before any task was launched
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A load-generation instance failed
    #[error("instance {instance}: {message}")]
    Worker {
        /// Identifier of the failing instance
        instance: String,
        /// Underlying failure description
        message: String,
    },

    /// Buffered telemetry could not be drained within the flush window
    #[error("flush did not complete within {0:?}")]
    FlushTimeout(Duration),

    /// Benchmark throughput fell behind the historical baseline
    #[error(
        "performance regression: {current:.1} events/s against baseline {baseline:.1} events/s \
         (margin {margin})"
    )]
    Regression {
        /// Events per second measured by this run
        current: f64,
        /// Best comparable historical events per second
        baseline: f64,
        /// Configured acceptable degradation ratio
        margin: f64,
    },

    /// Benchmark run interrupted; the partial result is not comparable
    #[error("run aborted by interrupt")]
    Aborted,

    /// HTTP transport failure toward the backend or analytics store
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected response from the analytics store
    #[error("analytics store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Worker`] from an instance id and any displayable cause.
    pub fn worker(instance: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Worker {
            instance: instance.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
