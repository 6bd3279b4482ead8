pub use crate::builder::LruCacheBuilder;
pub use crate::error::{ConfigError, InvariantError};

#[cfg(feature = "metrics")]
pub use crate::metrics::LruMetricsSnapshot;
#[cfg(feature = "concurrency")]
pub use crate::policy::concurrent_lru::ConcurrentLruCache;
pub use crate::policy::lru::LruCore;
pub use crate::traits::{EvictCallback, EvictionListener, FnListener, Weigher};
