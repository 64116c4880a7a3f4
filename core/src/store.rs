//! Elasticsearch-backed benchmark history

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::traits::{BenchmarkRecord, MetricsStore};

/// Index holding one document per benchmark run
const INDEX: &str = "hey-ingest-benchmarks";

/// [`MetricsStore`] talking to the analytics store over its HTTP API
pub struct EsMetricsStore {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: BenchmarkRecord,
}

impl EsMetricsStore {
    /// Build a store client from the run configuration
    ///
    /// `es_auth` is `user:password`; an empty string means no authentication.
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.es_url.trim_end_matches('/').to_string(),
            credentials: split_credentials(&config.es_auth),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, Some(password));
        }
        builder
    }
}

fn split_credentials(auth: &str) -> Option<(String, String)> {
    if auth.is_empty() {
        return None;
    }
    match auth.split_once(':') {
        Some((user, password)) => Some((user.to_string(), password.to_string())),
        None => Some((auth.to_string(), String::new())),
    }
}

#[async_trait]
impl MetricsStore for EsMetricsStore {
    async fn recent(&self, service_name: &str, days: u32) -> Result<Vec<BenchmarkRecord>> {
        let query = serde_json::json!({
            "size": 100,
            "sort": [{ "@timestamp": "desc" }],
            "query": {
                "bool": {
                    "filter": [
                        { "term": { "service_name.keyword": service_name } },
                        { "range": { "@timestamp": { "gte": format!("now-{days}d") } } }
                    ]
                }
            }
        });

        let response = self
            .request(reqwest::Method::POST, &format!("/{INDEX}/_search"))
            .json(&query)
            .send()
            .await?;

        // A missing index just means no history yet.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = response.error_for_status()?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("malformed search response: {e}")))?;
        Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
    }

    async fn record(&self, record: &BenchmarkRecord) -> Result<()> {
        self.request(reqwest::Method::POST, &format!("/{INDEX}/_doc"))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
