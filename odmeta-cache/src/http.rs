//! HTTP schema transport.
//!
//! Fetches `GET {base_url}/{metadata_path}/{name}` and decodes the body as a
//! [`SchemaDocument`].

use crate::config::HttpTransportConfig;
use crate::retry::{NoRetry, RetryPolicy};
use crate::transport::{FetchError, SchemaTransport};
use async_trait::async_trait;
use odmeta_model::SchemaDocument;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// [`SchemaTransport`] backed by a JSON-over-HTTP metadata endpoint.
pub struct HttpSchemaTransport {
    config: HttpTransportConfig,
    client: Client,
    retry: Arc<dyn RetryPolicy>,
}

impl HttpSchemaTransport {
    /// Creates a transport that does not retry.
    pub fn new(config: HttpTransportConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            retry: Arc::new(NoRetry),
        })
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry = policy;
        self
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// URL serving the schema for `name`.
    pub fn entity_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.metadata_path.trim_matches('/'),
            urlencoding::encode(name.trim())
        )
    }

    async fn fetch_once(&self, name: &str) -> Result<SchemaDocument, FetchError> {
        let mut request = self.client.get(self.entity_url(name));
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(format!("schema request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, name, body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(format!("read schema body failed: {e}")))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

fn status_error(status: StatusCode, name: &str, body: String) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound(name.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FetchError::Auth(format!("HTTP {}: {body}", status.as_u16()))
        }
        _ => FetchError::Status {
            status: status.as_u16(),
            message: body,
            retryable: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        },
    }
}

#[async_trait]
impl SchemaTransport for HttpSchemaTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_entity_schema(&self, name: &str) -> Result<SchemaDocument, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(name).await {
                Ok(doc) => return Ok(doc),
                Err(err) => match self.retry.next_delay(attempt, &err) {
                    Some(delay) => {
                        debug!(
                            entity = %name,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Retrying schema fetch"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        if attempt > 0 {
                            warn!(entity = %name, attempts = attempt + 1, error = %err, "Schema fetch gave up");
                        }
                        return Err(err);
                    }
                },
            }
        }
    }
}
