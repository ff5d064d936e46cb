//! Immutable catalog snapshots.
//!
//! A snapshot pairs the entry map with the alias table built from exactly
//! those entries. Readers hold an `Arc<CatalogSnapshot>`; writers derive a
//! new snapshot and swap the pointer, so a reader never sees entries and
//! aliases from different generations.

use crate::entry::CacheEntry;
use odmeta_model::{normalize_name, AliasKind, AliasTable, SchemaResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Keyed by normalized canonical name.
    entries: HashMap<String, CacheEntry>,
    aliases: AliasTable,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves any accepted spelling of an entity name.
    pub fn lookup(&self, raw: &str) -> Option<(AliasKind, &CacheEntry)> {
        self.lookup_normalized(&normalize_name(raw))
    }

    pub fn lookup_normalized(&self, name: &str) -> Option<(AliasKind, &CacheEntry)> {
        let found = self.aliases.lookup_normalized(name)?;
        self.entries
            .get(&found.canonical)
            .map(|entry| (found.kind, entry))
    }

    /// Entry by canonical name (any case).
    pub fn get(&self, canonical: &str) -> Option<&CacheEntry> {
        self.entries.get(&normalize_name(canonical))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A copy with `entry` added or replacing the same canonical entity.
    ///
    /// Fails without side effects if one of the entry's names is already
    /// claimed, for the same kind, by a different entity.
    pub(crate) fn with_entry(&self, entry: CacheEntry) -> SchemaResult<Self> {
        let key = normalize_name(entry.schema().canonical_name());
        let mut next = self.clone();
        next.aliases.remove_canonical(&key);
        next.aliases.insert_schema(entry.schema())?;
        next.entries.insert(key, entry);
        Ok(next)
    }

    /// A copy with one entry marked stale at `epoch`, or `None` if it is
    /// absent.
    pub(crate) fn with_stale(&self, canonical_key: &str, epoch: u64) -> Option<Self> {
        let entry = self.entries.get(canonical_key)?.clone();
        let mut next = self.clone();
        next.entries
            .insert(canonical_key.to_string(), entry.into_stale(epoch));
        Some(next)
    }

    /// A copy with every entry marked stale at `epoch`.
    pub(crate) fn all_stale(&self, epoch: u64) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.clone().into_stale(epoch)))
                .collect(),
            aliases: self.aliases.clone(),
        }
    }
}
