pub mod lru;

#[cfg(feature = "concurrency")]
pub mod concurrent_lru;
