//! Fluent builder for LRU caches.
//!
//! Collects the bounds, the weigher and the eviction callback, then builds
//! either the thread-safe [`ConcurrentLruCache`] or the single-threaded
//! [`LruCore`].
//!
//! ## Example
//!
//! ```rust
//! use lrukit::builder::LruCacheBuilder;
//!
//! let cache = LruCacheBuilder::<u64, String>::new(100)
//!     .weigher(|v| v.len() as u64)
//!     .weight_limit(1024)
//!     .build()
//!     .unwrap();
//! cache.add(1, "hello".to_string());
//! assert_eq!(cache.weight_total(), 5);
//! ```
//!
//! Without an explicit `weight_limit`, a weigher is accepted with no weight
//! bound (`u64::MAX`), so only the entry count limits the cache.

use std::fmt;
use std::hash::Hash;

use crate::error::ConfigError;
#[cfg(feature = "concurrency")]
use crate::policy::concurrent_lru::ConcurrentLruCache;
use crate::policy::lru::LruCore;
use crate::traits::{EvictCallback, EvictionListener, Weigher};

/// Builder for LRU cache instances.
pub struct LruCacheBuilder<K, V> {
    capacity: usize,
    weight_limit: Option<u64>,
    weigher: Option<Weigher<V>>,
    on_evicted: Option<EvictCallback<K, V>>,
}

impl<K, V> LruCacheBuilder<K, V> {
    /// Starts a builder for a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            weight_limit: None,
            weigher: None,
            on_evicted: None,
        }
    }

    /// Caps the sum of entry weights. Only meaningful with a [`weigher`](Self::weigher).
    pub fn weight_limit(mut self, weight_limit: u64) -> Self {
        self.weight_limit = Some(weight_limit);
        self
    }

    /// Sets the function that weighs each value on `add`.
    pub fn weigher<F>(mut self, weigher: F) -> Self
    where
        F: Fn(&V) -> u64 + Send + Sync + 'static,
    {
        self.weigher = Some(Box::new(weigher));
        self
    }

    /// Sets the callback run for every entry the concurrent cache gives up.
    pub fn on_evicted<F>(mut self, on_evicted: F) -> Self
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        self.on_evicted = Some(Box::new(on_evicted));
        self
    }

    fn effective_weight_limit(&self) -> u64 {
        match (self.weight_limit, &self.weigher) {
            (Some(limit), _) => limit,
            (None, Some(_)) => u64::MAX,
            (None, None) => 0,
        }
    }

    /// Builds a thread-safe cache.
    #[cfg(feature = "concurrency")]
    pub fn build(self) -> Result<ConcurrentLruCache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone + Send + Sync,
        V: Clone + Send + Sync,
    {
        let weight_limit = self.effective_weight_limit();
        ConcurrentLruCache::with_weight_limit_and_evict(
            self.capacity,
            weight_limit,
            self.weigher,
            self.on_evicted,
        )
    }

    /// Builds a single-threaded engine reporting removals to `listener`.
    ///
    /// Fails if [`on_evicted`](Self::on_evicted) was set: the engine reports
    /// through `listener` only.
    pub fn build_core<L>(self, listener: L) -> Result<LruCore<K, V, L>, ConfigError>
    where
        K: Eq + Hash + Clone,
        L: EvictionListener<K, V>,
    {
        if self.on_evicted.is_some() {
            return Err(ConfigError::new(
                "on_evicted is only used by build(); pass a listener to build_core",
            ));
        }
        let weight_limit = self.effective_weight_limit();
        LruCore::with_weight_limit(self.capacity, weight_limit, self.weigher, listener)
    }
}

impl<K, V> fmt::Debug for LruCacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCacheBuilder")
            .field("capacity", &self.capacity)
            .field("weight_limit", &self.weight_limit)
            .field("weigher", &self.weigher.is_some())
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FnListener;

    #[test]
    fn test_zero_capacity_fails() {
        let err = LruCacheBuilder::<u64, u64>::new(0).build_core(()).unwrap_err();
        assert_eq!(err.message(), "must provide a positive size");
    }

    #[test]
    fn test_weigher_without_limit_is_unbounded() {
        let core = LruCacheBuilder::<u64, u64>::new(4)
            .weigher(|v| *v)
            .build_core(())
            .unwrap();
        assert_eq!(core.weight_limit(), u64::MAX);
        assert_eq!(core.capacity(), 4);
    }

    #[test]
    fn test_explicit_limit_wins() {
        let mut evicted = Vec::new();
        {
            let mut core = LruCacheBuilder::new(10)
                .weigher(|v: &u64| *v)
                .weight_limit(10)
                .build_core(FnListener(|k: &'static str, v: u64| evicted.push((k, v))))
                .unwrap();
            core.add("a", 4);
            core.add("b", 4);
            assert!(core.add("c", 4));
            assert_eq!(core.weight_total(), 8);
        }
        assert_eq!(evicted, vec![("a", 4)]);
    }

    #[test]
    fn test_build_core_rejects_callback() {
        let err = LruCacheBuilder::<u8, u8>::new(4)
            .on_evicted(|_, _| {})
            .build_core(())
            .unwrap_err();
        assert!(err.message().contains("build_core"));
    }

    #[test]
    fn test_default_limit_still_accounts_past_u64_max() {
        let mut core = LruCacheBuilder::<&'static str, u64>::new(4)
            .weigher(|v| *v)
            .build_core(())
            .unwrap();
        core.add("a", u64::MAX);
        assert!(core.add("b", 1));
        assert_eq!(core.keys(), vec!["b"]);
        assert_eq!(core.weight_total(), 1);
    }

    #[test]
    fn test_debug_hides_closures() {
        let builder = LruCacheBuilder::<u8, u8>::new(3).weigher(|_| 1);
        let dbg = format!("{:?}", builder);
        assert!(dbg.contains("capacity: 3"));
        assert!(dbg.contains("weigher: true"));
        assert!(dbg.contains("on_evicted: false"));
    }

    #[cfg(feature = "concurrency")]
    mod concurrent {
        use std::sync::{Arc, Mutex};

        use super::*;

        #[test]
        fn test_build_with_callback() {
            let log = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&log);
            let cache = LruCacheBuilder::new(1)
                .on_evicted(move |k: u32, v: u32| sink.lock().unwrap().push((k, v)))
                .build()
                .unwrap();
            cache.add(1, 10);
            cache.add(2, 20);
            assert_eq!(*log.lock().unwrap(), vec![(1, 10)]);
        }

        #[test]
        fn test_build_rejects_zero() {
            assert!(LruCacheBuilder::<u8, u8>::new(0).build().is_err());
        }
    }
}
