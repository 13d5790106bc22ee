//! Bounded in-memory entry store with least-recently-used eviction.

use std::collections::HashMap;
use std::sync::Mutex;

use url::Url;

use super::cache_entry::CacheEntry;
use super::http_cache::CacheStore;

/// In-memory [`CacheStore`] holding at most `capacity` entries.
///
/// Recency is tracked with a monotonic counter bumped on every lookup;
/// inserting beyond capacity evicts the entry with the oldest stamp. One
/// mutex guards the whole map, so the map is never observed mid-mutation.
pub struct LruStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    entries: HashMap<Url, Stored>,
    tick: u64,
}

struct Stored {
    entry: CacheEntry,
    last_used: u64,
}

impl LruStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                tick: 0,
            }),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CacheStore for LruStore {
    fn find(&self, url: &Url) -> Option<CacheEntry> {
        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;
        let stored = inner.entries.get_mut(url)?;
        stored.last_used = tick;
        Some(stored.entry.clone())
    }

    fn delete(&self, url: &Url) {
        self.lock().entries.remove(url);
    }

    fn delete_all(&self) {
        self.lock().entries.clear();
    }

    fn create(&self, url: Url, entry: CacheEntry) {
        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;
        inner.entries.insert(url, Stored {
            entry,
            last_used: tick,
        });
        while inner.entries.len() > self.capacity {
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, stored)| stored.last_used)
                .map(|(url, _)| url.clone());
            match victim {
                Some(url) => {
                    tracing::debug!(target: "restq::cache", url = %url, "lru eviction");
                    inner.entries.remove(&url);
                }
                None => break,
            }
        }
    }
}
