//! Entity name resolution for request builders.

use crate::error::CacheResult;
use crate::manager::{MetadataCache, ResolvedName};
use odmeta_model::{AliasKind, EntitySchema};
use std::sync::Arc;

/// Maps any accepted spelling of an entity name to its schema.
///
/// Holds a handle to the cache it reads from; several resolvers may share
/// one cache.
#[derive(Clone)]
pub struct NameResolver {
    cache: MetadataCache,
}

impl NameResolver {
    pub fn new(cache: MetadataCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Resolves `raw_name`, fetching the schema on first use.
    pub async fn resolve(&self, raw_name: &str) -> CacheResult<Arc<EntitySchema>> {
        self.cache.resolve(raw_name).await
    }

    /// Resolves `raw_name` and reports which kind of name matched.
    pub async fn resolve_match(&self, raw_name: &str) -> CacheResult<ResolvedName> {
        self.cache.resolve_match(raw_name).await
    }

    /// The canonical entity name for `raw_name`.
    pub async fn canonical_name(&self, raw_name: &str) -> CacheResult<String> {
        Ok(self.resolve(raw_name).await?.canonical_name().to_string())
    }

    /// The entity set name used in request URLs, falling back to the
    /// canonical name when the entity declares none.
    pub async fn entity_set_name(&self, raw_name: &str) -> CacheResult<String> {
        let schema = self.resolve(raw_name).await?;
        Ok(schema
            .entity_set_name()
            .unwrap_or_else(|| schema.canonical_name())
            .to_string())
    }

    /// Resolves from the cached catalog only.
    pub fn resolve_cached(&self, raw_name: &str) -> Option<(AliasKind, Arc<EntitySchema>)> {
        let snapshot = self.cache.snapshot();
        snapshot
            .lookup(raw_name)
            .map(|(kind, entry)| (kind, entry.schema().clone()))
    }
}
