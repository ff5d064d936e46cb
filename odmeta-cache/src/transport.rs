//! Schema transport abstraction.
//!
//! The cache never talks to the network directly. It asks a
//! [`SchemaTransport`] for one entity's schema document and owns everything
//! after that: validation, publication, freshness.

use async_trait::async_trait;
use odmeta_model::SchemaDocument;
use thiserror::Error;

/// Errors a transport can report for a single schema request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service has no entity by this name.
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        retryable: bool,
    },

    /// The response body is not a schema document.
    #[error("malformed schema response: {0}")]
    Malformed(String),

    #[error("request timed out")]
    Timeout,

    #[error("fetch aborted")]
    Aborted,
}

impl FetchError {
    /// Returns true if the same request may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout => true,
            FetchError::Status { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Source of entity schema documents.
#[async_trait]
pub trait SchemaTransport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Fetches the schema document for the entity addressed by `name`.
    ///
    /// `name` may be any of the entity's accepted spellings.
    async fn fetch_entity_schema(&self, name: &str) -> Result<SchemaDocument, FetchError>;
}

/// In-process transport for tests.
pub mod mock {
    use super::*;
    use odmeta_model::normalize_name;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A transport serving documents from memory.
    ///
    /// A request matches a document when its normalized name equals any of
    /// the document's names. The document is picked when the request
    /// arrives, before any delay. Queued failures are returned, one per
    /// request, in place of the document.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        documents: Mutex<Vec<SchemaDocument>>,
        failures: Mutex<VecDeque<FetchError>>,
        delay: Mutex<Duration>,
        fetches: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl MockTransport {
        /// Creates an empty mock transport.
        pub fn new() -> Self {
            Self::default()
        }

        /// Builder form of [`insert`](Self::insert).
        pub fn with_document(self, doc: SchemaDocument) -> Self {
            self.insert(doc);
            self
        }

        /// Serves `doc`, replacing any document with the same entity name.
        pub fn insert(&self, doc: SchemaDocument) {
            let key = normalize_name(&doc.name);
            let mut docs = self.documents.lock();
            docs.retain(|d| normalize_name(&d.name) != key);
            docs.push(doc);
        }

        /// Stops serving the entity named `name`.
        pub fn remove(&self, name: &str) {
            let key = normalize_name(name);
            self.documents.lock().retain(|d| normalize_name(&d.name) != key);
        }

        /// Makes every request sleep for `delay` before answering.
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = delay;
        }

        /// Queues a failure for the next request.
        pub fn fail_next(&self, err: FetchError) {
            self.failures.lock().push_back(err);
        }

        /// Number of requests received so far.
        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        /// Names requested so far, in arrival order.
        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().clone()
        }

        fn find(&self, name: &str) -> Option<SchemaDocument> {
            let key = normalize_name(name);
            self.documents
                .lock()
                .iter()
                .find(|doc| {
                    [
                        Some(doc.name.as_str()),
                        doc.logical_name.as_deref(),
                        doc.entity_set_name.as_deref(),
                        doc.collection_name.as_deref(),
                    ]
                    .into_iter()
                    .flatten()
                    .any(|n| normalize_name(n) == key)
                })
                .cloned()
        }
    }

    #[async_trait]
    impl SchemaTransport for MockTransport {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn fetch_entity_schema(&self, name: &str) -> Result<SchemaDocument, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().push(name.to_string());
            let found = self.find(name);

            let delay = *self.delay.lock();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if let Some(err) = self.failures.lock().pop_front() {
                return Err(err);
            }
            found.ok_or_else(|| FetchError::NotFound(name.to_string()))
        }
    }
}
