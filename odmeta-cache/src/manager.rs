//! The metadata cache: snapshot reads, single-flight fetches, background
//! refresh.
//!
//! Reads clone the current `Arc<CatalogSnapshot>` and never wait on a
//! writer. The only path that blocks a caller is a miss: the first caller
//! for a key spawns one fetch task and every caller for that key waits on
//! its broadcast. Stale hits are answered from the snapshot at once and
//! refreshed in the background.

use crate::config::CacheConfig;
use crate::entry::{CacheEntry, EntryState};
use crate::error::{CacheError, CacheResult};
use crate::pending::{self, FetchOutcome, Joined, PendingFetches, PendingGuard};
use crate::snapshot::CatalogSnapshot;
use crate::store::{CatalogStore, PersistedEntry};
use crate::transport::{FetchError, SchemaTransport};
use odmeta_codec::{serialize_key, validate_key, KeyFormat};
use odmeta_model::{normalize_name, AliasKind, EntitySchema};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Counters describing cache traffic since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered by a fresh entry.
    pub hits: u64,
    /// Lookups that found no entry and had to wait for a fetch.
    pub misses: u64,
    /// Lookups answered by a stale entry.
    pub stale_hits: u64,
    /// Transport requests started, foreground and background.
    pub fetches: u64,
    /// Background refreshes started.
    pub refreshes: u64,
    /// Fetches that ended in an error.
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_hits: AtomicU64,
    fetches: AtomicU64,
    refreshes: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// A resolved entity name.
#[derive(Debug, Clone)]
pub struct ResolvedName {
    pub schema: Arc<EntitySchema>,
    /// Which kind of name the request matched.
    pub matched: AliasKind,
}

struct CacheInner {
    transport: Arc<dyn SchemaTransport>,
    config: CacheConfig,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    /// Serializes snapshot writers. Readers only touch `snapshot`.
    publish_lock: Mutex<()>,
    pending: Arc<PendingFetches>,
    counters: Counters,
    /// Bumped by every invalidation; fetches record it when they start.
    epoch: AtomicU64,
    closed: AtomicBool,
}

/// Process-wide entity metadata cache.
///
/// Cheap to clone; clones share one catalog. Construct one per service
/// connection and hand it to whatever needs schemas.
#[derive(Clone)]
pub struct MetadataCache {
    inner: Arc<CacheInner>,
}

impl MetadataCache {
    pub fn new(transport: Arc<dyn SchemaTransport>, config: CacheConfig) -> Self {
        info!(
            transport = transport.name(),
            ttl_secs = config.ttl_secs,
            "Metadata cache created"
        );
        Self {
            inner: Arc::new(CacheInner {
                transport,
                config,
                snapshot: RwLock::new(Arc::new(CatalogSnapshot::new())),
                publish_lock: Mutex::new(()),
                pending: Arc::new(PendingFetches::new()),
                counters: Counters::default(),
                epoch: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// The current catalog snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.inner.current()
    }

    /// Returns the schema for any accepted spelling of an entity name,
    /// fetching it if the catalog has no entry yet.
    ///
    /// Misses are deduplicated per normalized spelling. A cold burst for
    /// `"CustomersV3"` and `"Customers"` sends one request for each name;
    /// both publish the same entity.
    pub async fn get_schema(&self, name: &str) -> CacheResult<Arc<EntitySchema>> {
        self.resolve_match(name).await.map(|r| r.schema)
    }

    /// Same as [`get_schema`](Self::get_schema).
    pub async fn resolve(&self, name: &str) -> CacheResult<Arc<EntitySchema>> {
        self.get_schema(name).await
    }

    /// Resolves `name` and reports which kind of name it matched.
    pub async fn resolve_match(&self, name: &str) -> CacheResult<ResolvedName> {
        self.inner.ensure_open()?;
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(CacheError::NotFound(name.to_string()));
        }

        if let Some(resolved) = self.lookup_cached(&key) {
            return Ok(resolved);
        }

        Counters::bump(&self.inner.counters.misses);
        let joined = self.inner.pending.join_or_start(
            &key,
            || self.inner.current().lookup_normalized(&key).map(|(_, e)| e.schema().clone()),
            |guard, tx| self.spawn_fetch(name.trim().to_string(), guard, tx, false),
        );
        if let Joined::Waiting(rx) = joined {
            self.await_fetch(rx, name).await?;
        }

        self.inner
            .current()
            .lookup_normalized(&key)
            .map(|(matched, entry)| ResolvedName {
                schema: entry.schema().clone(),
                matched,
            })
            .ok_or_else(|| CacheError::NotFound(name.trim().to_string()))
    }

    /// Returns the cached schema for `name` without fetching, refreshing or
    /// counting the lookup.
    pub fn peek(&self, name: &str) -> Option<Arc<EntitySchema>> {
        self.inner
            .current()
            .lookup(name)
            .map(|(_, entry)| entry.schema().clone())
    }

    /// Validates `values` against the entity's key and renders the predicate.
    pub async fn key_predicate(
        &self,
        name: &str,
        values: &Map<String, Value>,
        format: KeyFormat,
    ) -> CacheResult<String> {
        let schema = self.get_schema(name).await?;
        let key = validate_key(&schema, values)?;
        Ok(serialize_key(&key, format)?)
    }

    /// Marks the entity addressed by `name` stale. Returns false when the
    /// catalog has no such entity.
    pub fn invalidate(&self, name: &str) -> bool {
        let _writer = self.inner.publish_lock.lock();
        let current = self.inner.current();
        let Some(found) = current.aliases().lookup(name) else {
            return false;
        };
        let epoch = self.inner.next_epoch();
        match current.with_stale(&found.canonical, epoch) {
            Some(next) => {
                self.inner.swap(next);
                info!(entity = %found.canonical, "Invalidated cached schema");
                true
            }
            None => false,
        }
    }

    /// Marks every entry stale. Entries refresh one by one as they are read.
    pub fn refresh_all(&self) -> usize {
        let _writer = self.inner.publish_lock.lock();
        let current = self.inner.current();
        let count = current.len();
        if count > 0 {
            let epoch = self.inner.next_epoch();
            self.inner.swap(current.all_stale(epoch));
        }
        info!("Marked {} cached schemas stale", count);
        count
    }

    /// Lifecycle state of the entity addressed by `name`.
    pub fn entry_state(&self, name: &str) -> EntryState {
        let key = normalize_name(name);
        if let Some((_, entry)) = self.inner.current().lookup_normalized(&key) {
            return entry.state(self.inner.config.ttl());
        }
        if self.inner.pending.contains(&key) {
            EntryState::Fetching
        } else {
            EntryState::Empty
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.inner.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.current().is_empty()
    }

    /// Canonical names of every cached entity, sorted.
    pub fn canonical_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .current()
            .entries()
            .map(|e| e.schema().canonical_name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Number of fetches currently in flight.
    pub fn pending_fetches(&self) -> usize {
        self.inner.pending.len()
    }

    /// Writes every cached entry to `store`.
    pub fn persist(&self, store: &CatalogStore) -> CacheResult<usize> {
        self.inner.ensure_open()?;
        let records: Vec<PersistedEntry> = self
            .inner
            .current()
            .entries()
            .map(PersistedEntry::from_entry)
            .collect();
        store.save_all(&records)
    }

    /// Loads entries saved by [`persist`](Self::persist).
    ///
    /// Restored entries are stale, so the first read of each triggers a
    /// background refresh. Records written by another catalog format, with
    /// a version that does not match their document, or whose names collide
    /// with entries already cached, are skipped. Entities already cached are
    /// left alone.
    pub fn restore(&self, store: &CatalogStore) -> CacheResult<usize> {
        self.inner.ensure_open()?;
        let records = store.load()?;

        let _writer = self.inner.publish_lock.lock();
        let mut next = (*self.inner.current()).clone();
        let mut restored = 0;
        for record in records {
            if !record.is_current() {
                warn!(
                    entity = %record.canonical_name,
                    format_version = record.format_version,
                    "Skipping persisted schema from a different catalog format"
                );
                continue;
            }
            if next.get(&record.canonical_name).is_some() {
                continue;
            }
            let schema = match EntitySchema::from_document(record.document) {
                Ok(schema) => Arc::new(schema),
                Err(e) => {
                    warn!(entity = %record.canonical_name, error = %e, "Skipping invalid persisted schema");
                    continue;
                }
            };
            match next.with_entry(CacheEntry::restored(schema, record.fetched_at_ms)) {
                Ok(updated) => {
                    next = updated;
                    restored += 1;
                }
                Err(e) => {
                    warn!(entity = %record.canonical_name, error = %e, "Skipping persisted schema");
                }
            }
        }
        if restored > 0 {
            self.inner.swap(next);
        }
        info!("Restored {} schemas from catalog store", restored);
        Ok(restored)
    }

    /// Aborts in-flight fetches, drops the catalog and rejects further
    /// calls with [`CacheError::Closed`].
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let aborted = self.inner.pending.abort_all();
        let _writer = self.inner.publish_lock.lock();
        self.inner.swap(CatalogSnapshot::new());
        info!(aborted, "Metadata cache shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Snapshot lookup. Counts the hit and schedules a refresh when stale.
    fn lookup_cached(&self, key: &str) -> Option<ResolvedName> {
        let snapshot = self.inner.current();
        let (matched, entry) = snapshot.lookup_normalized(key)?;

        match entry.state(self.inner.config.ttl()) {
            EntryState::Stale => {
                Counters::bump(&self.inner.counters.stale_hits);
                self.spawn_refresh(entry.schema().canonical_name());
            }
            _ => Counters::bump(&self.inner.counters.hits),
        }
        Some(ResolvedName {
            schema: entry.schema().clone(),
            matched,
        })
    }

    /// Starts a background refresh for a canonical name unless one is
    /// already running.
    fn spawn_refresh(&self, canonical: &str) {
        let key = normalize_name(canonical);
        let mut started = false;
        self.inner.pending.join_or_start(
            &key,
            || None,
            |guard, tx| {
                started = true;
                self.spawn_fetch(canonical.to_string(), guard, tx, true)
            },
        );
        if started {
            Counters::bump(&self.inner.counters.refreshes);
            debug!(entity = %canonical, "Refreshing stale schema in background");
        }
    }

    fn spawn_fetch(
        &self,
        name: String,
        guard: PendingGuard,
        tx: watch::Sender<FetchOutcome>,
        refresh: bool,
    ) -> tokio::task::AbortHandle {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.fetch_and_publish(&name, refresh).await;
            drop(guard);
            tx.send_replace(Some(result));
        })
        .abort_handle()
    }

    async fn await_fetch(
        &self,
        rx: watch::Receiver<FetchOutcome>,
        name: &str,
    ) -> CacheResult<Arc<EntitySchema>> {
        let outcome = match self.inner.config.wait_timeout() {
            Some(limit) => tokio::time::timeout(limit, pending::wait(rx))
                .await
                .map_err(|_| CacheError::Timeout(name.trim().to_string()))?,
            None => pending::wait(rx).await,
        };

        match outcome {
            Some(result) => result,
            None if self.is_closed() => Err(CacheError::Closed),
            None => Err(CacheError::Fetch(FetchError::Aborted)),
        }
    }
}

impl CacheInner {
    fn current(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.read().clone()
    }

    fn swap(&self, next: CatalogSnapshot) {
        *self.snapshot.write() = Arc::new(next);
    }

    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    /// Body of a fetch task: ask the transport, build, publish.
    async fn fetch_and_publish(&self, name: &str, refresh: bool) -> CacheResult<Arc<EntitySchema>> {
        Counters::bump(&self.counters.fetches);
        let started = self.epoch.load(Ordering::SeqCst);
        debug!(entity = %name, transport = self.transport.name(), "Fetching entity schema");

        let result = match self.transport.fetch_entity_schema(name).await {
            Ok(doc) => EntitySchema::from_document(doc)
                .map_err(CacheError::from)
                .and_then(|schema| self.publish(schema, started)),
            Err(FetchError::NotFound(_)) => Err(CacheError::NotFound(name.to_string())),
            Err(e) => Err(CacheError::Fetch(e)),
        };

        if let Err(e) = &result {
            Counters::bump(&self.counters.failures);
            if refresh {
                warn!(entity = %name, error = %e, "Background refresh failed; keeping stale schema");
            } else {
                warn!(entity = %name, error = %e, "Schema fetch failed");
            }
        }
        result
    }

    /// Publishes a freshly fetched schema into a new snapshot.
    ///
    /// When the entity is already cached with the same non-empty version and
    /// identical content, the existing `Arc` is kept and only its timestamp
    /// is renewed. An entry invalidated after epoch `started` stays stale,
    /// since the document may predate the invalidation.
    fn publish(&self, schema: EntitySchema, started: u64) -> CacheResult<Arc<EntitySchema>> {
        let _writer = self.publish_lock.lock();
        self.ensure_open()?;

        let current = self.current();
        let existing = current.get(schema.canonical_name());
        let schema = match existing {
            Some(existing)
                if !schema.version().is_empty() && **existing.schema() == schema =>
            {
                debug!(entity = %schema.canonical_name(), version = %schema.version(), "Schema unchanged");
                existing.schema().clone()
            }
            _ => Arc::new(schema),
        };

        let mut entry = CacheEntry::new(schema.clone());
        if let Some(epoch) = existing
            .and_then(CacheEntry::invalidated_at)
            .filter(|&epoch| epoch > started)
        {
            debug!(entity = %schema.canonical_name(), "Invalidated during fetch; publishing as stale");
            entry = entry.into_stale(epoch);
        }

        let next = current.with_entry(entry)?;
        self.swap(next);
        info!(
            entity = %schema.canonical_name(),
            version = %schema.version(),
            "Published entity schema"
        );
        Ok(schema)
    }
}
