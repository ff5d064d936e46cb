//! Cache and transport configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`MetadataCache`](crate::MetadataCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which an entry is served stale and refreshed in the
    /// background. Zero makes every hit stale.
    pub ttl_secs: u64,
    /// Upper bound on how long one caller waits for an in-flight fetch.
    /// `None` waits for the fetch to finish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_timeout_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            wait_timeout_ms: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration for [`HttpSchemaTransport`](crate::HttpSchemaTransport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    /// Service root, e.g. `https://erp.example.com`.
    pub base_url: String,
    /// Path under the root that serves one schema document per entity.
    pub metadata_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            metadata_path: "metadata/entities".to_string(),
            bearer_token: None,
            request_timeout_secs: 30,
        }
    }
}
