//! Cache entries and their freshness state.

use odmeta_model::EntitySchema;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Lifecycle state of one entity in the cache.
///
/// `Empty` and `Fetching` describe names with no entry yet; an entry itself
/// is always `Populated` or `Stale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    Fetching,
    Populated,
    Stale,
}

/// A published schema plus when it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    schema: Arc<EntitySchema>,
    fetched_at: Instant,
    fetched_at_ms: u64,
    /// Invalidation epoch, set while the entry is marked stale.
    invalidated_at: Option<u64>,
}

impl CacheEntry {
    pub(crate) fn new(schema: Arc<EntitySchema>) -> Self {
        Self {
            schema,
            fetched_at: Instant::now(),
            fetched_at_ms: unix_millis(),
            invalidated_at: None,
        }
    }

    /// An entry loaded from persistent storage. It starts stale.
    pub(crate) fn restored(schema: Arc<EntitySchema>, fetched_at_ms: u64) -> Self {
        Self {
            schema,
            fetched_at: Instant::now(),
            fetched_at_ms,
            invalidated_at: Some(0),
        }
    }

    pub(crate) fn into_stale(self, epoch: u64) -> Self {
        Self {
            invalidated_at: Some(epoch),
            ..self
        }
    }

    /// Epoch of the invalidation that marked this entry stale.
    pub(crate) fn invalidated_at(&self) -> Option<u64> {
        self.invalidated_at
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Wall-clock fetch time, milliseconds since the Unix epoch.
    pub fn fetched_at_ms(&self) -> u64 {
        self.fetched_at_ms
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated_at.is_some()
    }

    /// `Stale` once invalidated or older than `ttl`, otherwise `Populated`.
    pub fn state(&self, ttl: Duration) -> EntryState {
        if self.invalidated_at.is_some() || self.age() >= ttl {
            EntryState::Stale
        } else {
            EntryState::Populated
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
