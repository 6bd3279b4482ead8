//! # Least Recently Used (LRU) Engine
//!
//! Single-threaded LRU cache with a bound on entry count and an optional
//! bound on cumulative weight. Thread safety is layered on top by
//! [`ConcurrentLruCache`](crate::policy::concurrent_lru::ConcurrentLruCache).
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                           LruCore<K, V, L>                               │
//!   │                                                                          │
//!   │   ┌──────────────────────────────────────────────────────────────────┐   │
//!   │   │  FxHashMap<K, NodeId> (index into the recency list)              │   │
//!   │   │                                                                  │   │
//!   │   │  ┌─────────┬───────────────────────────────────────────────┐     │   │
//!   │   │  │   Key   │  NodeId                                       │     │   │
//!   │   │  ├─────────┼───────────────────────────────────────────────┤     │   │
//!   │   │  │  "a"    │  ───────────────────────────────────────────┐ │     │   │
//!   │   │  │  "b"    │  ─────────────────────────────────────┐     │ │     │   │
//!   │   │  │  "c"    │  ───────────────────────────────┐     │     │ │     │   │
//!   │   │  └─────────┴─────────────────────────────────┼─────┼─────┼─┘     │   │
//!   │   └──────────────────────────────────────────────┼─────┼─────┼───────┘   │
//!   │                                                  ▼     ▼     ▼           │
//!   │   ┌──────────────────────────────────────────────────────────────────┐   │
//!   │   │  RecencyList<Entry<K, V>>  (owns key, value, weight)             │   │
//!   │   │                                                                  │   │
//!   │   │  head ──► [c] ◄──► [b] ◄──► [a] ◄── tail                         │   │
//!   │   │  (MRU)                       (LRU, next victim)                  │   │
//!   │   └──────────────────────────────────────────────────────────────────┘   │
//!   │                                                                          │
//!   │   capacity ─ weight_limit ─ weight_total ─ weigher ─ listener            │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction check
//!
//! Runs after every operation that can grow the cache or shrink a bound
//! (`add`, `resize`, `reset_weight_limit`):
//!
//! ```text
//!   while len > capacity || weight_total > weight_limit:
//!       victim = list.back          (always the LRU entry, for either bound)
//!       unlink victim, weight_total -= victim.weight
//!       listener.on_evict(victim.key, victim.value)
//! ```
//!
//! Each iteration removes one entry, so the loop ends after at most `len`
//! steps even with a capacity or weight limit of zero.
//!
//! ## Methods
//!
//! | Method                  | Recency | Description                                  |
//! |-------------------------|---------|----------------------------------------------|
//! | `add(k, v)`             | bump    | Insert or update, then run the eviction check|
//! | `get(&k)`               | bump    | Value on hit                                 |
//! | `peek(&k)`              | none    | Value on hit                                 |
//! | `contains(&k)`          | none    | Membership                                   |
//! | `remove(&k)`            | -       | Unlink + notify                              |
//! | `remove_oldest()`       | -       | Unlink LRU + notify, returns the pair        |
//! | `get_oldest()`          | none    | LRU pair by reference                        |
//! | `keys()`                | none    | Oldest → newest snapshot                     |
//! | `purge()`               | -       | Notify every entry (index order), then clear |
//! | `resize(n)`             | -       | New capacity, returns evicted count          |
//! | `reset_weight_limit(n)` | -       | New weight limit, returns evicted count      |
//!
//! ## Weight accounting
//!
//! Without a weigher every entry weighs 0, so `weight_total` stays 0 and only
//! the count bound applies. With a weigher the limit is taken literally: a
//! limit of 0 evicts every entry whose weight is positive. An update that
//! grows an entry's weight can evict *other* entries; the updated entry is at
//! the front, so it is the last candidate.
//!
//! The running total is a `u128`, so a sum that passes `u64::MAX` is still
//! exact when the eviction check compares it with the limit.
//!
//! ## Example
//!
//! ```
//! use lrukit::policy::lru::LruCore;
//!
//! let mut cache: LruCore<&str, u32> = LruCore::new(2).unwrap();
//! cache.add("a", 1);
//! cache.add("b", 2);
//! assert!(cache.add("c", 3)); // evicts "a"
//!
//! assert_eq!(cache.keys(), vec!["b", "c"]);
//! assert_eq!(cache.get(&"a"), None);
//! ```

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ds::{NodeId, RecencyList};
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::{LruMetrics, LruMetricsSnapshot};
use crate::traits::{EvictionListener, Weigher};

/// Upper bound on up-front index/list allocation; larger caches grow on demand.
const PREALLOC_LIMIT: usize = 1024;

/// Cached record; owned by the recency list.
struct Entry<K, V> {
    key: K,
    value: V,
    weight: u64,
}

/// Single-threaded LRU cache core with count and weight bounds.
///
/// `L` receives every entry the cache gives up. Use `()` when nothing needs
/// to observe evictions.
pub struct LruCore<K, V, L = ()> {
    map: FxHashMap<K, NodeId>,
    list: RecencyList<Entry<K, V>>,
    capacity: usize,
    /// Wider than a weight so a sum past `u64::MAX` is seen by the eviction
    /// check instead of being clipped.
    weight_total: u128,
    weight_limit: u64,
    weigher: Option<Weigher<V>>,
    listener: L,
    #[cfg(feature = "metrics")]
    metrics: LruMetrics,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a count-bounded cache with no eviction listener.
    ///
    /// Fails with [`ConfigError`] if `size` is zero.
    ///
    /// ```
    /// use lrukit::policy::lru::LruCore;
    ///
    /// let cache: LruCore<u32, String> = LruCore::new(100).unwrap();
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(LruCore::<u32, String>::new(0).is_err());
    /// ```
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        Self::with_weight_limit(size, 0, None, ())
    }
}

impl<K, V, L> LruCore<K, V, L>
where
    K: Eq + Hash + Clone,
    L: EvictionListener<K, V>,
{
    /// Creates a count-bounded cache that reports removals to `listener`.
    pub fn with_listener(size: usize, listener: L) -> Result<Self, ConfigError> {
        Self::with_weight_limit(size, 0, None, listener)
    }

    /// Creates a cache bounded by `size` entries and `weight_limit` total weight.
    ///
    /// `weigher` is called once per `add`; when it is `None` every entry
    /// weighs 0 and `weight_limit` has no effect.
    pub fn with_weight_limit(
        size: usize,
        weight_limit: u64,
        weigher: Option<Weigher<V>>,
        listener: L,
    ) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::non_positive_size());
        }
        let prealloc = size.min(PREALLOC_LIMIT);
        debug!(
            capacity = size,
            weight_limit,
            weighted = weigher.is_some(),
            "lru cache created"
        );
        Ok(LruCore {
            map: FxHashMap::with_capacity_and_hasher(prealloc, Default::default()),
            list: RecencyList::with_capacity(prealloc),
            capacity: size,
            weight_total: 0,
            weight_limit,
            weigher,
            listener,
            #[cfg(feature = "metrics")]
            metrics: LruMetrics::default(),
        })
    }

    /// Adds or updates `key`, moving it to the MRU position.
    ///
    /// Returns `true` if the eviction check removed at least one entry.
    pub fn add(&mut self, key: K, value: V) -> bool {
        let weight = self.weigh(&value);

        if let Some(&id) = self.map.get(&key) {
            self.list.move_to_front(id);
            if let Some(entry) = self.list.get_mut(id) {
                entry.value = value;
                self.weight_total =
                    self.weight_total - u128::from(entry.weight) + u128::from(weight);
                entry.weight = weight;
            }
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_update();
            return self.check_evict() > 0;
        }

        let id = self.list.push_front(Entry {
            key: key.clone(),
            value,
            weight,
        });
        self.map.insert(key, id);
        self.weight_total += u128::from(weight);
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();

        self.check_evict() > 0
    }

    /// Looks up `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let id = match self.map.get(key) {
            Some(&id) => id,
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_miss();
                return None;
            },
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();

        self.list.move_to_front(id);
        self.list.get(id).map(|entry| &entry.value)
    }

    /// Removes `key`, notifying the listener. Returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(&id) = self.map.get(key) else {
            return false;
        };
        if let Some(entry) = self.unlink(id) {
            #[cfg(feature = "metrics")]
            self.metrics.record_remove();
            self.listener.on_evict(entry.key, entry.value);
        }
        true
    }

    /// Notifies the listener of every entry, then empties the cache.
    ///
    /// Notification order follows the index, not recency.
    pub fn purge(&mut self) {
        let prealloc = self.capacity.min(PREALLOC_LIMIT);
        let map = std::mem::replace(
            &mut self.map,
            FxHashMap::with_capacity_and_hasher(prealloc, Default::default()),
        );
        let mut list = std::mem::replace(&mut self.list, RecencyList::with_capacity(prealloc));
        self.weight_total = 0;

        let purged = map.len();
        for (_, id) in map {
            if let Some(entry) = list.remove(id) {
                self.listener.on_evict(entry.key, entry.value);
            }
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_purge(purged);
        debug!(purged, "lru cache purged");
    }

    /// Sets a new entry bound and evicts down to it. Returns the evicted count.
    pub fn resize(&mut self, size: usize) -> usize {
        self.capacity = size;
        let evicted = self.check_evict();
        debug!(capacity = size, evicted, "lru cache resized");
        evicted
    }

    /// Sets a new weight bound and evicts down to it. Returns the evicted count.
    pub fn reset_weight_limit(&mut self, weight_limit: u64) -> usize {
        self.weight_limit = weight_limit;
        let evicted = self.check_evict();
        debug!(weight_limit, evicted, "lru cache weight limit reset");
        evicted
    }

    /// Evicts from the back until both bounds hold.
    fn check_evict(&mut self) -> usize {
        let mut evicted = 0usize;
        while self.list.len() > self.capacity
            || self.weight_total > u128::from(self.weight_limit)
        {
            let Some(id) = self.list.back_id() else {
                break;
            };
            if let Some(entry) = self.unlink(id) {
                trace!(
                    weight = entry.weight,
                    len = self.list.len(),
                    weight_total = self.weight_total,
                    "lru entry evicted"
                );
                self.listener.on_evict(entry.key, entry.value);
            }
            evicted += 1;
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_evict_check(evicted);

        evicted
    }

    #[inline]
    fn weigh(&self, value: &V) -> u64 {
        self.weigher.as_ref().map_or(0, |weigh| weigh(value))
    }
}

impl<K, V, L> LruCore<K, V, L>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: EvictionListener<K, V>,
{
    /// Removes the least recently used entry, notifying the listener.
    ///
    /// The listener receives the pair by value, so a copy is returned to the
    /// caller.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let id = self.list.back_id()?;
        let entry = self.unlink(id)?;
        #[cfg(feature = "metrics")]
        self.metrics.record_remove();
        let oldest = (entry.key.clone(), entry.value.clone());
        self.listener.on_evict(entry.key, entry.value);
        Some(oldest)
    }
}

impl<K, V, L> LruCore<K, V, L>
where
    K: Eq + Hash + Clone,
{
    /// Returns `true` if `key` is cached. Does not touch recency.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Looks up `key` without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let value = self
            .map
            .get(key)
            .and_then(|&id| self.list.get(id))
            .map(|entry| &entry.value);
        #[cfg(feature = "metrics")]
        self.metrics.record_peek(value.is_some());
        value
    }

    /// Returns the least recently used pair without removing it.
    pub fn get_oldest(&self) -> Option<(&K, &V)> {
        self.list.back().map(|entry| (&entry.key, &entry.value))
    }

    /// Snapshot of the keys from oldest to newest.
    pub fn keys(&self) -> Vec<K> {
        self.list
            .iter_oldest_first()
            .map(|entry| entry.key.clone())
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of the weights of all cached entries.
    #[inline]
    pub fn weight_total(&self) -> u64 {
        // every public operation ends with the total at or under the limit
        u64::try_from(self.weight_total).unwrap_or(u64::MAX)
    }

    #[inline]
    pub fn weight_limit(&self) -> u64 {
        self.weight_limit
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Detaches `id` from the list and the index and settles its weight.
    fn unlink(&mut self, id: NodeId) -> Option<Entry<K, V>> {
        let entry = self.list.remove(id)?;
        self.map.remove(&entry.key);
        self.weight_total -= u128::from(entry.weight);
        Some(entry)
    }

    /// Checks that the index, the recency list, the weight total and both
    /// bounds agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.validate()?;

        if self.map.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but list holds {} entries",
                self.map.len(),
                self.list.len()
            )));
        }

        for (key, &id) in &self.map {
            match self.list.get(id) {
                Some(entry) if entry.key == *key => {},
                Some(_) => return Err(InvariantError::new("index points at another key's entry")),
                None => return Err(InvariantError::new("index points at a freed slot")),
            }
        }

        let weight_sum: u128 = self
            .list
            .iter_oldest_first()
            .map(|entry| u128::from(entry.weight))
            .sum();
        if weight_sum != self.weight_total {
            return Err(InvariantError::new(format!(
                "weight total {} differs from entry sum {}",
                self.weight_total, weight_sum
            )));
        }

        if self.list.len() > self.capacity {
            return Err(InvariantError::new("entry count exceeds capacity"));
        }
        if self.weight_total > u128::from(self.weight_limit) {
            return Err(InvariantError::new("weight total exceeds weight limit"));
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl<K, V, L> LruCore<K, V, L>
where
    K: Eq + Hash + Clone,
{
    pub fn metrics_snapshot(&self) -> LruMetricsSnapshot {
        self.metrics.snapshot(
            self.list.len(),
            self.capacity,
            self.weight_total(),
            self.weight_limit,
        )
    }
}

impl<K, V, L> fmt::Debug for LruCore<K, V, L>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("weight_total", &self.weight_total)
            .field("weight_limit", &self.weight_limit)
            .finish_non_exhaustive()
    }
}

impl<K, V, L> Extend<(K, V)> for LruCore<K, V, L>
where
    K: Eq + Hash + Clone,
    L: EvictionListener<K, V>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}
