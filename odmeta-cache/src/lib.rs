//! Entity metadata cache for odmeta.
//!
//! - [`MetadataCache`]: process-wide catalog of entity schemas with
//!   single-flight fetching, TTL freshness and background refresh
//! - [`NameResolver`]: resolves any accepted entity name through a cache
//! - [`SchemaTransport`]: where schemas come from; [`HttpSchemaTransport`]
//!   for a JSON metadata endpoint, [`transport::mock`] for tests
//! - [`CatalogStore`]: optional SQLite persistence between runs
//!
//! # Example
//!
//! ```no_run
//! use odmeta_cache::{CacheConfig, HttpSchemaTransport, HttpTransportConfig, MetadataCache};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpSchemaTransport::new(HttpTransportConfig {
//!     base_url: "https://erp.example.com".into(),
//!     ..Default::default()
//! })?;
//! let cache = MetadataCache::new(Arc::new(transport), CacheConfig::default());
//! let schema = cache.get_schema("customers").await?;
//! println!("{} has {} key fields", schema.canonical_name(), schema.key_fields().len());
//! # Ok(())
//! # }
//! ```

mod config;
mod entry;
mod error;
mod http;
mod manager;
mod pending;
mod resolver;
mod retry;
mod snapshot;
mod store;
pub mod transport;

pub use config::{CacheConfig, HttpTransportConfig};
pub use entry::{CacheEntry, EntryState};
pub use error::{CacheError, CacheResult};
pub use http::HttpSchemaTransport;
pub use manager::{CacheStats, MetadataCache, ResolvedName};
pub use resolver::NameResolver;
pub use retry::{ExponentialBackoff, NoRetry, RetryPolicy};
pub use snapshot::CatalogSnapshot;
pub use store::{CatalogStore, PersistedEntry, CATALOG_FORMAT_VERSION};
pub use transport::{FetchError, SchemaTransport};
