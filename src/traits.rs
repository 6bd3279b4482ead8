//! # Eviction seams
//!
//! The engine reports every entry that leaves the cache (capacity or weight
//! eviction, `remove`, `remove_oldest`, `purge`) through an
//! [`EvictionListener`]. The listener is a type parameter of
//! [`LruCore`](crate::policy::lru::LruCore), so a cache without a listener
//! pays nothing for the hook.
//!
//! ```text
//!   LruCore<K, V, L>
//!        │  on_evict(key, value)   (owned pair, in eviction order)
//!        ▼
//!   ┌──────────────────────┬──────────────────────────┬─────────────────────────────┐
//!   │ ()                   │ FnListener<F>            │ Option<EvictionBuffer<K,V>> │
//!   │ drops the pair       │ calls F(key, value)      │ buffers for the concurrent  │
//!   │                      │                          │ wrapper (flushed unlocked)  │
//!   └──────────────────────┴──────────────────────────┴─────────────────────────────┘
//! ```
//!
//! ## Injected functions
//!
//! | Alias                 | Shape                              | Used by                 |
//! |-----------------------|------------------------------------|-------------------------|
//! | [`Weigher<V>`]        | `Fn(&V) -> u64`                    | weight accounting       |
//! | [`EvictCallback<K,V>`]| `Fn(K, V)`                         | `ConcurrentLruCache`    |

/// Computes the weight of a value. Called once per `add`.
pub type Weigher<V> = Box<dyn Fn(&V) -> u64 + Send + Sync>;

/// User eviction callback for the concurrent cache. Runs with no lock held.
pub type EvictCallback<K, V> = Box<dyn Fn(K, V) + Send + Sync>;

/// Receives each entry the engine removes, by value.
pub trait EvictionListener<K, V> {
    fn on_evict(&mut self, key: K, value: V);
}

/// No-op listener; evicted pairs are dropped.
impl<K, V> EvictionListener<K, V> for () {
    #[inline]
    fn on_evict(&mut self, _key: K, _value: V) {}
}

/// An absent listener behaves like `()`.
impl<K, V, L> EvictionListener<K, V> for Option<L>
where
    L: EvictionListener<K, V>,
{
    #[inline]
    fn on_evict(&mut self, key: K, value: V) {
        if let Some(listener) = self {
            listener.on_evict(key, value);
        }
    }
}

/// An [`EvictionListener`] backed by a closure.
///
/// ```
/// use lrukit::policy::lru::LruCore;
/// use lrukit::traits::FnListener;
///
/// let mut evicted = Vec::new();
/// {
///     let mut cache = LruCore::with_listener(1, FnListener(|k: u32, v: u32| evicted.push((k, v))))
///         .unwrap();
///     cache.add(1, 10);
///     cache.add(2, 20);
/// }
/// assert_eq!(evicted, vec![(1, 10)]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FnListener<F>(pub F);

impl<K, V, F> EvictionListener<K, V> for FnListener<F>
where
    F: FnMut(K, V),
{
    #[inline]
    fn on_evict(&mut self, key: K, value: V) {
        (self.0)(key, value)
    }
}

/// Marker for caches that are safe to share across threads.
pub trait ConcurrentCache: Send + Sync {}
