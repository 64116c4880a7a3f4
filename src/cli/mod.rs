//! CLI argument parsing

use std::time::Duration;

use clap::Parser;
use hey_ingest_core::{Config, ConfigBuilder, ConfigError, RunMode};

/// Synthetic load and benchmark driver for telemetry ingestion backends
#[derive(Parser, Debug)]
#[command(name = "hey-ingest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Stop each instance's generation after this duration
    #[arg(long = "run", value_parser = humantime::parse_duration, default_value = "30s")]
    pub run_timeout: Duration,

    /// Wait at most this long for the post-stop flush
    #[arg(long = "flush", value_parser = humantime::parse_duration, default_value = "10s")]
    pub flush_timeout: Duration,

    /// Random seed; defaults to the current Unix time
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of concurrent load-generation instances (ignored with --bench)
    #[arg(long, default_value_t = 1)]
    pub instances: usize,

    /// Upper bound for the random per-instance start delay (ignored with --bench)
    #[arg(long = "delay", value_parser = humantime::parse_duration, default_value = "1s")]
    pub start_jitter: Duration,

    /// Service name attached to generated telemetry
    #[arg(long = "service-name", env = "HEY_SERVICE_NAME", default_value = "hey-service")]
    pub service_name: String,

    /// Ingestion backend URL
    #[arg(long = "server-url", env = "HEY_SERVER_URL", default_value = "http://localhost:8200")]
    pub server_url: String,

    /// Ingestion backend secret token
    #[arg(long = "secret-token", env = "HEY_SECRET_TOKEN", default_value = "")]
    pub secret_token: String,

    /// Ingestion backend API key
    #[arg(long = "api-key", env = "HEY_API_KEY", default_value = "")]
    pub api_key: String,

    /// Analytics store URL for benchmark history
    #[arg(long = "es-url", default_value = "http://localhost:9200")]
    pub es_url: String,

    /// Analytics store credentials as user:password
    #[arg(long = "es-auth", default_value = "")]
    pub es_auth: String,

    /// Output store URL of the backend under load
    #[arg(long = "apm-es-url", default_value = "http://localhost:9200")]
    pub apm_es_url: String,

    /// Output store credentials of the backend under load
    #[arg(long = "apm-es-auth", default_value = "")]
    pub apm_es_auth: String,

    /// Execute a single benchmark run instead of continuous load generation
    #[arg(long)]
    pub bench: bool,

    /// Acceptable performance decrease ratio before flagging a regression
    #[arg(long = "regression-margin", default_value_t = 1.1)]
    pub regression_margin: f64,

    /// Number of days back to compare benchmark results against
    #[arg(long = "regression-days", default_value = "7")]
    pub regression_days: String,

    /// Generate at most one transaction per this duration
    #[arg(long = "transaction-frequency", value_parser = humantime::parse_duration, default_value = "1ns")]
    pub transaction_frequency: Duration,

    /// Maximum transactions to generate (unbounded when omitted)
    #[arg(long = "transaction-limit")]
    pub transaction_limit: Option<usize>,

    /// Minimum spans per transaction
    #[arg(long = "span-min", default_value_t = 1)]
    pub span_min: usize,

    /// Maximum spans per transaction (raised to --span-min when lower)
    #[arg(long = "span-max", default_value_t = 10)]
    pub span_max: usize,

    /// Generate at most one error per this duration
    #[arg(long = "error-frequency", value_parser = humantime::parse_duration, default_value = "1ns")]
    pub error_frequency: Duration,

    /// Maximum errors to generate (unbounded when omitted)
    #[arg(long = "error-limit")]
    pub error_limit: Option<usize>,

    /// Minimum stack frames per error
    #[arg(long = "error-frames-min", default_value_t = 0)]
    pub error_frame_min: usize,

    /// Maximum stack frames per error
    #[arg(long = "error-frames-max", default_value_t = 10)]
    pub error_frame_max: usize,
}

impl Cli {
    /// Validate flags into the immutable run configuration
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let mode = if self.bench {
            RunMode::Benchmark
        } else {
            RunMode::LoadGeneration
        };

        let mut builder = ConfigBuilder::new()
            .mode(mode)
            .server(self.server_url, self.secret_token, self.api_key)
            .service_name(self.service_name)
            .analytics_store(self.es_url, self.es_auth)
            .backend_output_store(self.apm_es_url, self.apm_es_auth)
            .timeouts(self.run_timeout, self.flush_timeout)
            .instances(self.instances)
            .start_jitter(self.start_jitter)
            .transactions(
                self.transaction_frequency,
                self.transaction_limit.unwrap_or(usize::MAX),
            )
            .spans(self.span_min, self.span_max)
            .errors(self.error_frequency, self.error_limit.unwrap_or(usize::MAX))
            .error_frames(self.error_frame_min, self.error_frame_max)
            .regression(self.regression_margin, self.regression_days);

        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }

        builder.build()
    }
}
