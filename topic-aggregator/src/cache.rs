use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub written_at: Instant,
    pub payload: V,
}

/// Keyed store of `(written_at, payload)` pairs with a fixed time-to-live.
///
/// Entries are overwritten on refresh and never removed. A single lock guards
/// the whole map; two concurrent refreshes of one key may both fetch, and the
/// last `put` wins.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached payload if `force` is unset and the entry is at
    /// most `ttl` old. `None` means the caller should recompute and `put`.
    pub async fn get_or(&self, key: &K, ttl: Duration, force: bool) -> Option<V> {
        if force {
            return None;
        }

        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.written_at.elapsed() <= ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// `get_or` with the cache's own TTL
    pub async fn get(&self, key: &K, force: bool) -> Option<V> {
        self.get_or(key, self.ttl, force).await
    }

    pub async fn put(&self, key: K, payload: V) {
        let entry = CacheEntry {
            written_at: Instant::now(),
            payload,
        };
        self.entries.write().await.insert(key, entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
