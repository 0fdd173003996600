//! In-process TTL cache
//!
//! Read-through cache with a fixed time-to-live and no invalidation.
//! Expired entries are dropped on access, and every insert sweeps the map
//! once at least one TTL has passed since the previous sweep.

use std::hash::Hash;
use std::sync::{Arc, Mutex, TryLockError};
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Concurrent map with per-entry expiry. Cloning shares the storage.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: Arc<DashMap<K, Entry<V>>>,
    ttl: Duration,
    last_sweep: Arc<Mutex<Instant>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            last_sweep: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &K) -> Option<V> {
        let fresh = {
            let entry = self.entries.get(key)?;
            (entry.stored_at.elapsed() < self.ttl).then(|| entry.value.clone())
        };

        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    pub fn insert(&self, key: K, value: V) {
        self.sweep_if_due();
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the cached value or compute, store and return a new one.
    /// Errors are not cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            tracing::debug!("Cache hit");
            return Ok(hit);
        }

        let value = load().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    /// Keys never read again would otherwise stay forever
    fn sweep_if_due(&self) {
        let mut last = match self.last_sweep.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            // Another insert is sweeping
            Err(TryLockError::WouldBlock) => return,
        };
        if last.elapsed() < self.ttl {
            return;
        }
        *last = Instant::now();
        drop(last);

        let before = self.entries.len();
        self.purge_expired();
        let dropped = before.saturating_sub(self.entries.len());
        if dropped > 0 {
            tracing::debug!(dropped, remaining = self.entries.len(), "Cache swept");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
