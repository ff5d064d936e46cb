//! Alias table: every accepted spelling of an entity name → canonical name.
//!
//! Lookups are case-insensitive and ignore surrounding whitespace. When one
//! spelling is claimed by several kinds (possibly by different entities) the
//! kind with the highest priority wins, in [`AliasKind`] declaration order.
//! Within a single kind a spelling belongs to exactly one entity; a second
//! claimant is rejected with [`SchemaError::DuplicateAlias`].

use crate::error::{SchemaError, SchemaResult};
use crate::schema::EntitySchema;
use std::collections::HashMap;
use std::fmt;

/// The kind of name an alias is. Declaration order is resolution priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AliasKind {
    Canonical,
    Logical,
    EntitySet,
    Collection,
}

impl AliasKind {
    /// All kinds, highest priority first.
    pub const PRIORITY: [AliasKind; 4] = [
        AliasKind::Canonical,
        AliasKind::Logical,
        AliasKind::EntitySet,
        AliasKind::Collection,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AliasKind::Canonical => "canonical name",
            AliasKind::Logical => "logical name",
            AliasKind::EntitySet => "entity set name",
            AliasKind::Collection => "collection name",
        };
        f.write_str(s)
    }
}

/// Normalizes an entity name for lookup: trimmed and lower-cased.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Result of a successful alias lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMatch {
    /// Which kind of name matched.
    pub kind: AliasKind,
    /// Normalized canonical name of the entity.
    pub canonical: String,
}

/// Per-kind maps from normalized alias to normalized canonical name.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_kind: [HashMap<String, String>; 4],
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a set of schemas, failing on the first conflict.
    pub fn from_schemas<'a>(schemas: impl IntoIterator<Item = &'a EntitySchema>) -> SchemaResult<Self> {
        let mut table = Self::new();
        for schema in schemas {
            table.insert_schema(schema)?;
        }
        Ok(table)
    }

    /// Registers every name of `schema`.
    ///
    /// All names are checked before any is inserted, so a conflict leaves the
    /// table unchanged. Names already owned by the same canonical entity are
    /// not conflicts; call [`remove_canonical`](Self::remove_canonical) first
    /// when replacing an entity whose aliases may have changed.
    pub fn insert_schema(&mut self, schema: &EntitySchema) -> SchemaResult<()> {
        let canonical = normalize_name(schema.canonical_name());
        let names: Vec<(AliasKind, String)> = schema
            .names()
            .map(|(kind, name)| (kind, normalize_name(name)))
            .filter(|(_, name)| !name.is_empty())
            .collect();

        for (kind, alias) in &names {
            if let Some(existing) = self.by_kind[kind.slot()].get(alias) {
                if *existing != canonical {
                    return Err(SchemaError::DuplicateAlias {
                        alias: alias.clone(),
                        kind: *kind,
                        existing: existing.clone(),
                        incoming: canonical,
                    });
                }
            }
        }

        for (kind, alias) in names {
            self.by_kind[kind.slot()].insert(alias, canonical.clone());
        }
        Ok(())
    }

    /// Drops every alias pointing at the given normalized canonical name.
    pub fn remove_canonical(&mut self, canonical: &str) {
        for map in &mut self.by_kind {
            map.retain(|_, owner| owner != canonical);
        }
    }

    /// Resolves a raw name, applying kind priority.
    pub fn lookup(&self, raw: &str) -> Option<AliasMatch> {
        self.lookup_normalized(&normalize_name(raw))
    }

    /// Resolves an already normalized name.
    pub fn lookup_normalized(&self, name: &str) -> Option<AliasMatch> {
        if name.is_empty() {
            return None;
        }
        AliasKind::PRIORITY.iter().find_map(|kind| {
            self.by_kind[kind.slot()].get(name).map(|canonical| AliasMatch {
                kind: *kind,
                canonical: canonical.clone(),
            })
        })
    }

    /// Number of registered (kind, alias) pairs.
    pub fn len(&self) -> usize {
        self.by_kind.iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.iter().all(HashMap::is_empty)
    }
}
