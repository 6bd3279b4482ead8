//! # Concurrent LRU Cache
//!
//! Thread-safe wrapper around [`LruCore`] that runs the user's eviction
//! callback after the internal lock has been released, so a callback may call
//! back into the same cache without deadlocking.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                     ConcurrentLruCache<K, V>  (Clone = Arc clone)        │
//!   │                                                                          │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │  Arc<RwLock<LruCore<K, V, Option<EvictionBuffer<K, V>>>>>          │ │
//!   │   │                                                                    │ │
//!   │   │   LruCore ── on_evict(k, v) ──► EvictionBuffer { keys, values }    │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   │                                                                          │
//!   │   on_evicted: Option<Arc<dyn Fn(K, V) + Send + Sync>>                    │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Call flow for a mutating operation
//!
//! ```text
//!   add(k, v)
//!     1. write lock
//!     2. core.add(k, v)           evictions land in the buffer
//!     3. drain buffer             (still locked)
//!     4. drop guard
//!     5. on_evicted(k_i, v_i)     for each drained pair, in eviction order
//!     6. return to caller
//! ```
//!
//! The buffer exists only when a callback was configured. Without one the core
//! listener is `None` and evicted pairs are dropped immediately.
//!
//! ## Drains
//!
//! | Drain            | Used after                                               | Buffer handling          |
//! |------------------|----------------------------------------------------------|--------------------------|
//! | `Drain::All`     | `purge`, `resize`, `reset_weight_limit`, `remove_oldest` | swap in fresh vectors    |
//! | `Drain::Recent`  | `add`, `remove`, `*_or_add`                              | copy out, keep capacity  |
//!
//! Both hand every buffered pair to the callback exactly once, in order.
//!
//! ## Locking
//!
//! | Method                                                          | Lock  |
//! |-----------------------------------------------------------------|-------|
//! | `contains`, `peek`, `get_oldest`, `keys`, `len`, `weight_total` | Read  |
//! | `get`, `add`, `remove`, `remove_oldest`, `purge`                | Write |
//! | `resize`, `reset_weight_limit`                                  | Write |
//! | `get_or_add`, `contains_or_add`, `peek_or_add`                  | Write |
//!
//! `get` takes the write lock because a hit moves the entry to the front.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use lrukit::policy::concurrent_lru::ConcurrentLruCache;
//!
//! let evicted = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&evicted);
//! let cache = ConcurrentLruCache::with_evict(2, move |k: &'static str, v: u32| {
//!     sink.lock().unwrap().push((k, v));
//! })
//! .unwrap();
//!
//! cache.add("a", 1);
//! cache.add("b", 2);
//! assert!(cache.add("c", 3));
//! assert_eq!(*evicted.lock().unwrap(), vec![("a", 1)]);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::ConfigError;
#[cfg(feature = "metrics")]
use crate::metrics::LruMetricsSnapshot;
use crate::policy::lru::LruCore;
use crate::traits::{ConcurrentCache, EvictCallback, EvictionListener, Weigher};

/// Initial capacity of each eviction buffer.
pub const DEFAULT_EVICTED_BUFFER_SIZE: usize = 16;

type SharedCallback<K, V> = Arc<dyn Fn(K, V) + Send + Sync>;
type Core<K, V> = LruCore<K, V, Option<EvictionBuffer<K, V>>>;

/// Parallel key/value buffers filled while the write lock is held.
#[derive(Debug)]
pub(crate) struct EvictionBuffer<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
}

/// Pairs drained from an [`EvictionBuffer`], waiting for the callback.
struct Evicted<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drain {
    /// Take the vectors themselves and install fresh ones.
    All,
    /// Copy out this call's pairs and keep the allocation.
    Recent,
}

impl<K, V> EvictionBuffer<K, V> {
    fn new() -> Self {
        Self {
            keys: Vec::with_capacity(DEFAULT_EVICTED_BUFFER_SIZE),
            values: Vec::with_capacity(DEFAULT_EVICTED_BUFFER_SIZE),
        }
    }

    fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn drain(&mut self, mode: Drain) -> Evicted<K, V> {
        match mode {
            Drain::All => {
                let fresh = Self::new();
                Evicted {
                    keys: std::mem::replace(&mut self.keys, fresh.keys),
                    values: std::mem::replace(&mut self.values, fresh.values),
                }
            },
            Drain::Recent => Evicted {
                keys: self.keys.drain(..).collect(),
                values: self.values.drain(..).collect(),
            },
        }
    }
}

impl<K, V> EvictionListener<K, V> for EvictionBuffer<K, V> {
    #[inline]
    fn on_evict(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }
}

/// Thread-safe LRU cache with optional weight accounting.
///
/// Cloning is cheap and every clone shares the same entries.
pub struct ConcurrentLruCache<K, V> {
    inner: Arc<RwLock<Core<K, V>>>,
    on_evicted: Option<SharedCallback<K, V>>,
}

impl<K, V> Clone for ConcurrentLruCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            on_evicted: self.on_evicted.clone(),
        }
    }
}

impl<K, V> fmt::Debug for ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.read();
        f.debug_struct("ConcurrentLruCache")
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .field("weight_total", &cache.weight_total())
            .field("has_callback", &self.on_evicted.is_some())
            .finish_non_exhaustive()
    }
}

impl<K, V> ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates a cache holding at most `size` entries.
    ///
    /// ```
    /// use lrukit::policy::concurrent_lru::ConcurrentLruCache;
    ///
    /// let cache: ConcurrentLruCache<u32, String> = ConcurrentLruCache::new(100).unwrap();
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(cache.is_empty());
    /// ```
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        Self::with_weight_limit_and_evict(size, 0, None, None)
    }

    /// Creates a cache that calls `on_evicted` for every entry it gives up.
    pub fn with_evict<F>(size: usize, on_evicted: F) -> Result<Self, ConfigError>
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        Self::with_weight_limit_and_evict(size, 0, None, Some(Box::new(on_evicted)))
    }

    /// Creates a cache bounded by entry count and total weight.
    ///
    /// `weight_limit` is taken literally once a `weigher` is supplied; without
    /// one every entry weighs 0 and only `size` applies.
    pub fn with_weight_limit_and_evict(
        size: usize,
        weight_limit: u64,
        weigher: Option<Weigher<V>>,
        on_evicted: Option<EvictCallback<K, V>>,
    ) -> Result<Self, ConfigError> {
        let on_evicted: Option<SharedCallback<K, V>> = on_evicted.map(Arc::from);
        let buffer = on_evicted.as_ref().map(|_| EvictionBuffer::new());
        let core = LruCore::with_weight_limit(size, weight_limit, weigher, buffer)?;
        Ok(ConcurrentLruCache {
            inner: Arc::new(RwLock::new(core)),
            on_evicted,
        })
    }

    /// Adds or updates `key`. Returns `true` if an eviction occurred.
    pub fn add(&self, key: K, value: V) -> bool {
        let (evicted, pending) = {
            let mut cache = self.inner.write();
            let evicted = cache.add(key, value);
            (evicted, self.collect(&mut cache, Drain::Recent))
        };
        self.dispatch(pending);
        evicted
    }

    /// Looks up `key`, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.write();
        cache.get(key).cloned()
    }

    /// Returns `true` if `key` is cached, without touching recency.
    pub fn contains(&self, key: &K) -> bool {
        let cache = self.inner.read();
        cache.contains(key)
    }

    /// Looks up `key` without touching recency.
    pub fn peek(&self, key: &K) -> Option<V> {
        let cache = self.inner.read();
        cache.peek(key).cloned()
    }

    /// Returns the cached value if present (marking it recently used);
    /// otherwise adds `value`.
    ///
    /// Returns the previous value and whether the insert evicted anything.
    /// The lookup and the insert happen under one write lock.
    pub fn get_or_add(&self, key: K, value: V) -> (Option<V>, bool) {
        let (evicted, pending) = {
            let mut cache = self.inner.write();
            if let Some(previous) = cache.get(&key) {
                return (Some(previous.clone()), false);
            }
            let evicted = cache.add(key, value);
            (evicted, self.collect(&mut cache, Drain::Recent))
        };
        self.dispatch(pending);
        (None, evicted)
    }

    /// Adds `value` unless `key` is already cached. Does not touch recency on
    /// a hit.
    ///
    /// Returns whether the key was found and whether the insert evicted
    /// anything.
    pub fn contains_or_add(&self, key: K, value: V) -> (bool, bool) {
        let (evicted, pending) = {
            let mut cache = self.inner.write();
            if cache.contains(&key) {
                return (true, false);
            }
            let evicted = cache.add(key, value);
            (evicted, self.collect(&mut cache, Drain::Recent))
        };
        self.dispatch(pending);
        (false, evicted)
    }

    /// Like [`get_or_add`](Self::get_or_add) but a hit leaves recency alone.
    pub fn peek_or_add(&self, key: K, value: V) -> (Option<V>, bool) {
        let (evicted, pending) = {
            let mut cache = self.inner.write();
            if let Some(previous) = cache.peek(&key) {
                return (Some(previous.clone()), false);
            }
            let evicted = cache.add(key, value);
            (evicted, self.collect(&mut cache, Drain::Recent))
        };
        self.dispatch(pending);
        (None, evicted)
    }

    /// Removes `key`. Returns whether it was present.
    pub fn remove(&self, key: &K) -> bool {
        let (present, pending) = {
            let mut cache = self.inner.write();
            let present = cache.remove(key);
            (present, self.collect(&mut cache, Drain::Recent))
        };
        self.dispatch(pending);
        present
    }

    /// Removes and returns the least recently used entry.
    pub fn remove_oldest(&self) -> Option<(K, V)> {
        let (oldest, pending) = {
            let mut cache = self.inner.write();
            let oldest = cache.remove_oldest();
            (oldest, self.collect(&mut cache, Drain::All))
        };
        self.dispatch(pending);
        oldest
    }

    /// Returns the least recently used entry without removing it.
    pub fn get_oldest(&self) -> Option<(K, V)> {
        let cache = self.inner.read();
        cache.get_oldest().map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Keys from oldest to newest.
    pub fn keys(&self) -> Vec<K> {
        let cache = self.inner.read();
        cache.keys()
    }

    pub fn len(&self) -> usize {
        let cache = self.inner.read();
        cache.len()
    }

    pub fn is_empty(&self) -> bool {
        let cache = self.inner.read();
        cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        let cache = self.inner.read();
        cache.capacity()
    }

    /// Sum of the weights of all cached entries.
    pub fn weight_total(&self) -> u64 {
        let cache = self.inner.read();
        cache.weight_total()
    }

    pub fn weight_limit(&self) -> u64 {
        let cache = self.inner.read();
        cache.weight_limit()
    }

    /// Empties the cache, calling the callback once per entry.
    pub fn purge(&self) {
        let pending = {
            let mut cache = self.inner.write();
            cache.purge();
            self.collect(&mut cache, Drain::All)
        };
        self.dispatch(pending);
    }

    /// Changes the entry bound. Returns how many entries were evicted.
    pub fn resize(&self, size: usize) -> usize {
        let (evicted, pending) = {
            let mut cache = self.inner.write();
            let evicted = cache.resize(size);
            (evicted, self.collect(&mut cache, Drain::All))
        };
        self.dispatch(pending);
        evicted
    }

    /// Changes the weight bound. Returns how many entries were evicted.
    pub fn reset_weight_limit(&self, weight_limit: u64) -> usize {
        let (evicted, pending) = {
            let mut cache = self.inner.write();
            let evicted = cache.reset_weight_limit(weight_limit);
            (evicted, self.collect(&mut cache, Drain::All))
        };
        self.dispatch(pending);
        evicted
    }

    /// Drains whatever the core buffered during this critical section.
    fn collect(&self, cache: &mut Core<K, V>, mode: Drain) -> Option<Evicted<K, V>> {
        self.on_evicted.as_ref()?;
        let buffer = cache.listener_mut().as_mut()?;
        if buffer.is_empty() {
            return None;
        }
        Some(buffer.drain(mode))
    }

    /// Runs the user callback; the write guard must already be dropped.
    fn dispatch(&self, pending: Option<Evicted<K, V>>) {
        let (Some(callback), Some(evicted)) = (self.on_evicted.as_ref(), pending) else {
            return;
        };
        trace!(count = evicted.keys.len(), "dispatching eviction callbacks");
        for (key, value) in evicted.keys.into_iter().zip(evicted.values) {
            callback(key, value);
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V> ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn metrics_snapshot(&self) -> LruMetricsSnapshot {
        let cache = self.inner.read();
        cache.metrics_snapshot()
    }
}

impl<K, V> ConcurrentCache for ConcurrentLruCache<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
}
