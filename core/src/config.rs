//! Run configuration
//!
//! A [`Config`] is built once at startup and never mutated afterwards. All
//! randomized decisions in a run (start jitter, payload shape) derive from the
//! single `seed` field, so a run is reproducible given the same seed. The
//! builder owns the only repair rule (span clamp-up) and the only fatal
//! validation (non-numeric regression lookback in benchmark mode).

use std::time::Duration;

/// Operating mode selected for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Continuous load generation with N concurrent instances
    LoadGeneration,
    /// Single fixed-duration run judged against historical baselines
    Benchmark,
}

/// Immutable parameter set for one run
#[derive(Debug, Clone)]
pub struct Config {
    /// Operating mode
    pub mode: RunMode,

    /// Ingestion backend intake URL
    pub server_url: String,
    /// Ingestion backend secret token (may be empty)
    pub secret_token: String,
    /// Ingestion backend API key (may be empty)
    pub api_key: String,
    /// Service name attached to generated telemetry
    pub service_name: String,

    /// Analytics store URL for benchmark history
    pub es_url: String,
    /// Analytics store `user:password` credentials (may be empty)
    pub es_auth: String,
    /// Output store URL of the backend under load (opaque pass-through)
    pub apm_es_url: String,
    /// Output store credentials of the backend under load
    pub apm_es_auth: String,

    /// Active generation window per worker
    pub run_timeout: Duration,
    /// Post-stop drain window per worker
    pub flush_timeout: Duration,

    /// Number of concurrent load-generation instances
    pub instances: usize,
    /// Upper bound for the uniformly drawn per-instance start delay
    pub start_jitter: Duration,

    /// Minimum interval between generated transactions
    pub transaction_frequency: Duration,
    /// Maximum number of transactions to generate
    pub transaction_limit: usize,
    /// Minimum spans per transaction
    pub span_min: usize,
    /// Maximum spans per transaction (never below `span_min`)
    pub span_max: usize,
    /// Minimum interval between generated errors
    pub error_frequency: Duration,
    /// Maximum number of errors to generate
    pub error_limit: usize,
    /// Minimum stack frames per error
    pub error_frame_min: usize,
    /// Maximum stack frames per error
    pub error_frame_max: usize,

    /// Acceptable performance degradation ratio before flagging a regression
    pub regression_margin: f64,
    /// Lookback window in days for comparable historical results
    pub regression_days: u32,

    /// Seed for every randomized decision in the run
    pub seed: u64,
}

impl Config {
    /// Derive a stable per-instance seed for payload-shape randomness.
    ///
    /// Jitter is drawn from the master seed in instance-index order before
    /// spawning; payload draws inside each instance use this derived seed so
    /// concurrent instances never contend on one generator.
    pub fn instance_seed(&self, instance_id: &str) -> u64 {
        instance_id
            .bytes()
            .fold(self.seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64 + 1))
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Regression lookback did not parse as an integer number of days
    #[error("invalid regression lookback {0:?}: expected an integer number of days")]
    InvalidRegressionDays(String),

    /// Regression margin below 1.0 would flag improvements as regressions
    #[error("invalid regression margin {0}: must be >= 1.0")]
    InvalidRegressionMargin(f64),
}

/// Builder for [`Config`]
///
/// Defaults mirror a short local smoke run against a backend on localhost.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    mode: RunMode,
    server_url: String,
    secret_token: String,
    api_key: String,
    service_name: String,
    es_url: String,
    es_auth: String,
    apm_es_url: String,
    apm_es_auth: String,
    run_timeout: Duration,
    flush_timeout: Duration,
    instances: usize,
    start_jitter: Duration,
    transaction_frequency: Duration,
    transaction_limit: usize,
    span_min: usize,
    span_max: usize,
    error_frequency: Duration,
    error_limit: usize,
    error_frame_min: usize,
    error_frame_max: usize,
    regression_margin: f64,
    regression_days: String,
    seed: Option<u64>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            mode: RunMode::LoadGeneration,
            server_url: "http://localhost:8200".into(),
            secret_token: String::new(),
            api_key: String::new(),
            service_name: "hey-service".into(),
            es_url: "http://localhost:9200".into(),
            es_auth: String::new(),
            apm_es_url: "http://localhost:9200".into(),
            apm_es_auth: String::new(),
            run_timeout: Duration::from_secs(30),
            flush_timeout: Duration::from_secs(10),
            instances: 1,
            start_jitter: Duration::from_millis(1000),
            transaction_frequency: Duration::from_nanos(1),
            transaction_limit: usize::MAX,
            span_min: 1,
            span_max: 10,
            error_frequency: Duration::from_nanos(1),
            error_limit: usize::MAX,
            error_frame_min: 0,
            error_frame_max: 10,
            regression_margin: 1.1,
            regression_days: "7".into(),
            seed: None,
        }
    }
}

impl ConfigBuilder {
    /// Create a builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operating mode
    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set ingestion backend connection parameters
    pub fn server(
        mut self,
        url: impl Into<String>,
        secret_token: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        self.server_url = url.into();
        self.secret_token = secret_token.into();
        self.api_key = api_key.into();
        self
    }

    /// Set the service name attached to generated telemetry
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the analytics store used for benchmark history
    pub fn analytics_store(mut self, url: impl Into<String>, auth: impl Into<String>) -> Self {
        self.es_url = url.into();
        self.es_auth = auth.into();
        self
    }

    /// Set the output store of the backend under load
    pub fn backend_output_store(
        mut self,
        url: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        self.apm_es_url = url.into();
        self.apm_es_auth = auth.into();
        self
    }

    /// Set the run and flush windows
    pub fn timeouts(mut self, run: Duration, flush: Duration) -> Self {
        self.run_timeout = run;
        self.flush_timeout = flush;
        self
    }

    /// Set the instance count
    pub fn instances(mut self, instances: usize) -> Self {
        self.instances = instances;
        self
    }

    /// Set the start jitter bound
    pub fn start_jitter(mut self, bound: Duration) -> Self {
        self.start_jitter = bound;
        self
    }

    /// Set transaction pacing and cap
    pub fn transactions(mut self, frequency: Duration, limit: usize) -> Self {
        self.transaction_frequency = frequency;
        self.transaction_limit = limit;
        self
    }

    /// Set span count bounds per transaction
    pub fn spans(mut self, min: usize, max: usize) -> Self {
        self.span_min = min;
        self.span_max = max;
        self
    }

    /// Set error pacing and cap
    pub fn errors(mut self, frequency: Duration, limit: usize) -> Self {
        self.error_frequency = frequency;
        self.error_limit = limit;
        self
    }

    /// Set stack frame count bounds per error
    pub fn error_frames(mut self, min: usize, max: usize) -> Self {
        self.error_frame_min = min;
        self.error_frame_max = max;
        self
    }

    /// Set the regression margin and lookback window
    ///
    /// The lookback is kept as a raw string until `build`, where a value that
    /// does not parse as an integer is a fatal configuration error in
    /// benchmark mode.
    pub fn regression(mut self, margin: f64, days: impl Into<String>) -> Self {
        self.regression_margin = margin;
        self.regression_days = days.into();
        self
    }

    /// Set an explicit random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate and produce the immutable [`Config`]
    ///
    /// Repairs an inverted span range by raising `span_max` to `span_min`.
    /// When no seed was supplied, the current Unix time is used so unrelated
    /// runs do not repeat each other's sequences.
    pub fn build(self) -> Result<Config, ConfigError> {
        let span_max = self.span_max.max(self.span_min);

        let regression_days = if self.mode == RunMode::Benchmark {
            if self.regression_margin < 1.0 {
                return Err(ConfigError::InvalidRegressionMargin(self.regression_margin));
            }
            self.regression_days
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidRegressionDays(self.regression_days.clone()))?
        } else {
            // Load mode never consults the lookback; a malformed value is not fatal.
            self.regression_days.trim().parse::<u32>().unwrap_or(0)
        };

        let seed = self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

        Ok(Config {
            mode: self.mode,
            server_url: self.server_url,
            secret_token: self.secret_token,
            api_key: self.api_key,
            service_name: self.service_name,
            es_url: self.es_url,
            es_auth: self.es_auth,
            apm_es_url: self.apm_es_url,
            apm_es_auth: self.apm_es_auth,
            run_timeout: self.run_timeout,
            flush_timeout: self.flush_timeout,
            instances: self.instances,
            start_jitter: self.start_jitter,
            transaction_frequency: self.transaction_frequency,
            transaction_limit: self.transaction_limit,
            span_min: self.span_min,
            span_max,
            error_frequency: self.error_frequency,
            error_limit: self.error_limit,
            error_frame_min: self.error_frame_min,
            error_frame_max: self.error_frame_max,
            regression_margin: self.regression_margin,
            regression_days,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build() {
        let config = ConfigBuilder::new().seed(1).build().unwrap();
        assert_eq!(config.mode, RunMode::LoadGeneration);
        assert_eq!(config.instances, 1);
        assert_eq!(config.span_min, 1);
        assert_eq!(config.span_max, 10);
        assert_eq!(config.seed, 1);
    }

    #[test]
    fn test_span_clamp_up() {
        let config = ConfigBuilder::new().spans(5, 2).seed(1).build().unwrap();
        assert_eq!(config.span_min, 5);
        assert_eq!(config.span_max, 5);
    }

    #[test]
    fn test_span_range_kept_when_valid() {
        let config = ConfigBuilder::new().spans(2, 8).seed(1).build().unwrap();
        assert_eq!(config.span_min, 2);
        assert_eq!(config.span_max, 8);
    }

    #[test]
    fn test_non_numeric_lookback_fatal_in_benchmark_mode() {
        let result = ConfigBuilder::new()
            .mode(RunMode::Benchmark)
            .regression(1.1, "abc")
            .seed(1)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRegressionDays(ref s)) if s == "abc"
        ));
    }

    #[test]
    fn test_non_numeric_lookback_tolerated_in_load_mode() {
        let config = ConfigBuilder::new()
            .mode(RunMode::LoadGeneration)
            .regression(1.1, "abc")
            .seed(1)
            .build()
            .unwrap();
        assert_eq!(config.regression_days, 0);
    }

    #[test]
    fn test_margin_below_one_rejected_in_benchmark_mode() {
        let result = ConfigBuilder::new()
            .mode(RunMode::Benchmark)
            .regression(0.9, "7")
            .seed(1)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRegressionMargin(_))
        ));
    }

    #[test]
    fn test_lookback_parses_in_benchmark_mode() {
        let config = ConfigBuilder::new()
            .mode(RunMode::Benchmark)
            .regression(1.2, "14")
            .seed(1)
            .build()
            .unwrap();
        assert_eq!(config.regression_days, 14);
        assert_eq!(config.regression_margin, 1.2);
    }

    #[test]
    fn test_missing_seed_defaults_to_wall_clock() {
        let config = ConfigBuilder::new().build().unwrap();
        assert!(config.seed > 0);
    }

    #[test]
    fn test_instance_seeds_distinct_and_stable() {
        let config = ConfigBuilder::new().seed(42).build().unwrap();
        assert_ne!(config.instance_seed("0"), config.instance_seed("1"));
        assert_ne!(config.instance_seed("0"), config.seed);
        assert_eq!(config.instance_seed("3"), config.instance_seed("3"));
    }
}
