//! Shared test helpers for cache tests.

#![allow(dead_code)]

use odmeta_cache::transport::mock::MockTransport;
use odmeta_cache::{CacheConfig, MetadataCache};
use odmeta_model::{KeyFieldDoc, PropertyType, SchemaDocument};
use std::sync::Arc;

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Customers with every alias kind set and a composite key.
pub fn customers_doc() -> SchemaDocument {
    SchemaDocument::new("CustomersV3")
        .with_version("W/\"1\"")
        .with_logical_name("CustomerV3")
        .with_entity_set_name("CustomersV3Set")
        .with_collection_name("Customers")
        .with_key(KeyFieldDoc::new("dataAreaId", &PropertyType::String))
        .with_key(KeyFieldDoc::new("CustomerAccount", &PropertyType::String))
        .with_property("Blocked", &PropertyType::enumeration("CustVendorBlocked"))
}

/// The five-field mixed-type key used across the key contract tests.
pub fn ledger_doc() -> SchemaDocument {
    SchemaDocument::new("LedgerEntries")
        .with_version("7")
        .with_entity_set_name("LedgerEntriesSet")
        .with_key(KeyFieldDoc::new("CompanyId", &PropertyType::String))
        .with_key(KeyFieldDoc::new("RecordId", &PropertyType::Int64))
        .with_key(KeyFieldDoc::new("EffectiveDate", &PropertyType::Date))
        .with_key(KeyFieldDoc::new("Priority", &PropertyType::Int32))
        .with_key(KeyFieldDoc::new("IsActive", &PropertyType::enumeration("NoYes")))
}

pub fn workers_doc() -> SchemaDocument {
    SchemaDocument::new("Workers")
        .with_version("1")
        .with_collection_name("Employees")
        .with_key(KeyFieldDoc::new("PersonnelNumber", &PropertyType::String))
}

pub fn mock_with(docs: impl IntoIterator<Item = SchemaDocument>) -> Arc<MockTransport> {
    let transport = MockTransport::new();
    for doc in docs {
        transport.insert(doc);
    }
    Arc::new(transport)
}

pub fn cache_with(transport: &Arc<MockTransport>, config: CacheConfig) -> MetadataCache {
    MetadataCache::new(transport.clone(), config)
}

/// A cache over the standard fixtures with default configuration.
pub fn standard_cache() -> (Arc<MockTransport>, MetadataCache) {
    let transport = mock_with([customers_doc(), ledger_doc(), workers_doc()]);
    let cache = cache_with(&transport, CacheConfig::default());
    (transport, cache)
}
