//! In-memory caches shared across verifications.
//!
//! [`ContextCache`] holds JSON-LD contexts and every other document the
//! loader fetched over HTTP(S) or IPFS for the lifetime of the process.
//! [`TtlCache`] holds resolved `did:web` documents for a bounded time and is
//! swept by a background task.

use dashmap::DashMap;
use serde_json::Value;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Unbounded document cache keyed by URI.
///
/// Entries never expire. The cache can be pre-seeded with bundled documents
/// so that well-known contexts never touch the network.
#[derive(Debug, Clone, Default)]
pub struct ContextCache {
    documents: Arc<DashMap<String, Value>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache pre-populated with `(uri, document)` pairs.
    pub fn seeded<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let cache = Self::new();
        for (uri, document) in documents {
            cache.insert(uri, document);
        }
        cache
    }

    pub fn get(&self, uri: &str) -> Option<Value> {
        self.documents.get(uri).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, uri: impl Into<String>, document: Value) {
        self.documents.insert(uri.into(), document);
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Concurrent cache whose entries expire after a fixed time-to-live.
///
/// Expired entries are never returned. They are removed lazily on access and
/// eagerly by the sweep task started with [`TtlCache::start`].
pub struct TtlCache<K, V> {
    entries: Arc<DashMap<K, (V, Instant)>>,
    ttl: Duration,
    sweep_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            sweep_interval,
            sweeper: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let (value, inserted) = entry.value();
                if inserted.elapsed() < self.ttl {
                    return Some(value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, (value, Instant::now()));
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, (value, _))| value)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        sweep_entries(&self.entries, self.ttl)
    }

    /// Spawn the periodic sweep task. Calling it again while running is a no-op.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let Ok(mut sweeper) = self.sweeper.lock() else {
            return;
        };
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let entries = Arc::clone(&self.entries);
        let ttl = self.ttl;
        let interval = self.sweep_interval;
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = sweep_entries(&entries, ttl);
                if removed > 0 {
                    tracing::trace!(removed, "swept expired cache entries");
                }
            }
        }));
    }

    /// Stop the sweep task, if running.
    pub fn stop(&self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .map(|s| s.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_SWEEP_INTERVAL)
    }
}

impl<K, V> Drop for TtlCache<K, V> {
    fn drop(&mut self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("sweep_interval", &self.sweep_interval)
            .finish_non_exhaustive()
    }
}

fn sweep_entries<K, V>(entries: &DashMap<K, (V, Instant)>, ttl: Duration) -> usize
where
    K: Eq + Hash,
{
    let before = entries.len();
    entries.retain(|_, (_, inserted)| inserted.elapsed() < ttl);
    before.saturating_sub(entries.len())
}
