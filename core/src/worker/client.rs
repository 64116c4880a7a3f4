//! Intake transport for generated telemetry

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;

use super::payload::Event;

/// Delivery of generated events to the ingestion backend
///
/// The worker buffers events and hands them over in batches; `send` is also
/// the flush primitive, so an implementation has no hidden buffering of its
/// own to drain.
#[async_trait]
pub trait IngestClient: Send + Sync {
    /// Deliver a batch of events
    async fn send(&self, events: &[Event]) -> Result<()>;
}

/// HTTP intake client posting ndjson batches
pub struct HttpIngestClient {
    http: reqwest::Client,
    intake_url: String,
    authorization: Option<String>,
    service_name: String,
}

impl HttpIngestClient {
    /// Intake path of the ingestion backend
    const INTAKE_PATH: &'static str = "/intake/v2/events";

    /// Build a client from the run configuration
    ///
    /// A secret token takes precedence over an API key when both are set.
    pub fn from_config(config: &Config) -> Self {
        let authorization = if !config.secret_token.is_empty() {
            Some(format!("Bearer {}", config.secret_token))
        } else if !config.api_key.is_empty() {
            Some(format!("ApiKey {}", config.api_key))
        } else {
            None
        };
        Self {
            http: reqwest::Client::new(),
            intake_url: format!(
                "{}{}",
                config.server_url.trim_end_matches('/'),
                Self::INTAKE_PATH
            ),
            authorization,
            service_name: config.service_name.clone(),
        }
    }

    /// Render the ndjson request body: one metadata line, then one line per event
    fn body_for(&self, events: &[Event]) -> String {
        let metadata = serde_json::json!({
            "metadata": {
                "service": {
                    "name": self.service_name,
                    "agent": { "name": "hey-ingest", "version": env!("CARGO_PKG_VERSION") }
                }
            }
        });
        let mut body = metadata.to_string();
        for event in events {
            body.push('\n');
            // Serialize of these payload types cannot fail.
            body.push_str(&serde_json::to_string(event).unwrap_or_default());
        }
        body.push('\n');
        body
    }
}

#[async_trait]
impl IngestClient for HttpIngestClient {
    async fn send(&self, events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut request = self
            .http
            .post(&self.intake_url)
            .header("Content-Type", "application/x-ndjson")
            .body(self.body_for(events));
        if let Some(authorization) = &self.authorization {
            request = request.header("Authorization", authorization.clone());
        }
        let response = request.send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::worker::payload::PayloadGenerator;

    fn client(secret: &str, api_key: &str) -> HttpIngestClient {
        let config = ConfigBuilder::new()
            .server("http://apm.example:8200/", secret, api_key)
            .seed(1)
            .build()
            .unwrap();
        HttpIngestClient::from_config(&config)
    }

    #[test]
    fn test_intake_url_built_from_server_url() {
        let client = client("", "");
        assert_eq!(client.intake_url, "http://apm.example:8200/intake/v2/events");
    }

    #[test]
    fn test_secret_token_wins_over_api_key() {
        assert_eq!(
            client("s3cret", "key").authorization.as_deref(),
            Some("Bearer s3cret")
        );
        assert_eq!(
            client("", "key").authorization.as_deref(),
            Some("ApiKey key")
        );
        assert!(client("", "").authorization.is_none());
    }

    #[test]
    fn test_body_is_ndjson_with_metadata_first() {
        let config = ConfigBuilder::new().spans(1, 1).seed(5).build().unwrap();
        let mut gen = PayloadGenerator::new(5, &config);
        let events = vec![
            Event::Transaction(gen.next_transaction()),
            Event::Error(gen.next_error()),
        ];

        let body = client("", "").body_for(&events);
        let lines: Vec<&str> = body.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"metadata\""));
        assert!(lines[1].contains("\"transaction\""));
        assert!(lines[2].contains("\"error\""));
    }
}
