//! Per-key registry of in-flight fetches.
//!
//! The first caller to miss on a key registers a [`PendingFetch`] and spawns
//! the fetch; later callers for the same key subscribe to its `watch`
//! channel instead of fetching again. The fetch task owns a
//! [`PendingGuard`] whose drop removes the registration, so a task that
//! panics or is aborted still frees its key.

use crate::error::CacheResult;
use odmeta_model::EntitySchema;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// What a fetch broadcasts: `None` until it finishes.
pub(crate) type FetchOutcome = Option<CacheResult<Arc<EntitySchema>>>;

struct PendingFetch {
    id: u64,
    rx: watch::Receiver<FetchOutcome>,
    abort: AbortHandle,
}

/// Outcome of [`PendingFetches::join_or_start`].
pub(crate) enum Joined {
    /// The key was resolved without waiting.
    Ready(Arc<EntitySchema>),
    /// Wait on this channel for the fetch result.
    Waiting(watch::Receiver<FetchOutcome>),
}

#[derive(Default)]
pub(crate) struct PendingFetches {
    fetches: Mutex<HashMap<String, PendingFetch>>,
    next_id: AtomicU64,
}

impl PendingFetches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the fetch registered for `key`, or starts one.
    ///
    /// Under the registry lock, `recheck` is consulted before starting so a
    /// fetch that published between the caller's miss and this call is not
    /// repeated. `start` receives the guard and sender for the new fetch and
    /// returns the spawned task's abort handle.
    pub fn join_or_start<R, S>(self: &Arc<Self>, key: &str, recheck: R, start: S) -> Joined
    where
        R: FnOnce() -> Option<Arc<EntitySchema>>,
        S: FnOnce(PendingGuard, watch::Sender<FetchOutcome>) -> AbortHandle,
    {
        let mut fetches = self.fetches.lock();
        if let Some(pending) = fetches.get(key) {
            return Joined::Waiting(pending.rx.clone());
        }
        if let Some(schema) = recheck() {
            return Joined::Ready(schema);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        let guard = PendingGuard {
            registry: Arc::clone(self),
            key: key.to_string(),
            id,
        };
        let abort = start(guard, tx);
        fetches.insert(
            key.to_string(),
            PendingFetch {
                id,
                rx: rx.clone(),
                abort,
            },
        );
        Joined::Waiting(rx)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fetches.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fetches.lock().len()
    }

    /// Aborts every in-flight fetch and clears the registry.
    pub fn abort_all(&self) -> usize {
        let drained: Vec<PendingFetch> = self.fetches.lock().drain().map(|(_, p)| p).collect();
        for pending in &drained {
            pending.abort.abort();
        }
        drained.len()
    }

    fn remove(&self, key: &str, id: u64) {
        let mut fetches = self.fetches.lock();
        if fetches.get(key).is_some_and(|p| p.id == id) {
            fetches.remove(key);
        }
    }
}

/// Removes its fetch's registration when dropped.
pub(crate) struct PendingGuard {
    registry: Arc<PendingFetches>,
    key: String,
    id: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.key, self.id);
    }
}

/// Waits for a fetch to broadcast its outcome.
///
/// Returns `None` if the fetch task went away without sending, which
/// happens when it is aborted.
pub(crate) async fn wait(mut rx: watch::Receiver<FetchOutcome>) -> FetchOutcome {
    rx.wait_for(Option::is_some).await.ok().and_then(|v| v.clone())
}
