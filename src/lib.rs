//! lrukit: a bounded least-recently-used cache with optional weight limits.
//!
//! [`policy::lru::LruCore`] is the single-threaded engine. With the default
//! `concurrency` feature, [`policy::concurrent_lru::ConcurrentLruCache`] wraps
//! it in a read/write lock and runs eviction callbacks outside the lock.
//!
//! ```
//! use lrukit::prelude::*;
//!
//! let mut cache: LruCore<&str, u32> = LruCore::new(2).unwrap();
//! cache.add("a", 1);
//! cache.add("b", 2);
//! cache.get(&"a");
//! cache.add("c", 3);
//! assert_eq!(cache.keys(), vec!["a", "c"]);
//! ```

pub mod builder;
mod ds;
pub mod error;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;
