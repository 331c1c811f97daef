//! TTL cache shared by concurrent pipeline runs
//!
//! Entries are stored behind `Arc` and swapped whole, so a reader sees
//! either the previous entry or the new one. Misses for the same key are
//! coalesced: the first caller fetches while later callers wait on a
//! per-key gate and then read what the first one cached.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Read-mostly map with a time-to-live and singleflight population
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, Arc<CacheEntry<V>>>>,
    inflight: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Replace the entry for `key`
    pub async fn insert(&self, key: K, value: V) {
        let entry = Arc::new(CacheEntry {
            value,
            inserted_at: Instant::now(),
        });
        self.entries.write().await.insert(key, entry);
    }

    /// Return the cached value or run `fetch` to produce it.
    ///
    /// At most one `fetch` per key is in flight. Only successes are cached;
    /// a failed fetch lets the next waiter try again.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let gate = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = gate.lock().await;

            // Whoever held the gate before us may have filled the entry
            match self.get(&key).await {
                Some(value) => Ok(value),
                None => {
                    let fetched = fetch().await;
                    if let Ok(value) = &fetched {
                        self.insert(key.clone(), value.clone()).await;
                    }
                    fetched
                }
            }
        };

        self.release_gate(&key, gate).await;
        result
    }

    /// Drop the gate once no other caller holds a handle to it.
    ///
    /// Handles are cloned, and on this path dropped, under the `inflight` lock, so the
    /// count seen here is exact.
    async fn release_gate(&self, key: &K, gate: Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        let idle = inflight
            .get(key)
            .map(|current| Arc::ptr_eq(current, &gate) && Arc::strong_count(&gate) == 2)
            .unwrap_or(false);
        drop(gate);
        if idle {
            inflight.remove(key);
        }
    }

    /// Remove expired entries and abandoned gates; returns how many entries went
    pub async fn purge_expired(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
            before - entries.len()
        };

        // A gate only the map references belongs to a cancelled fetch
        self.inflight
            .lock()
            .await
            .retain(|_, gate| Arc::strong_count(gate) > 1);

        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
