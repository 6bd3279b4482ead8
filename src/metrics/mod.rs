//! Operation counters for the LRU engine (cargo feature `metrics`).
//!
//! Recording lives in [`metrics_impl::LruMetrics`], reading in
//! [`snapshot::LruMetricsSnapshot`]. Counters are relaxed atomics so `&self`
//! paths such as `peek` can record while the concurrent wrapper holds only a
//! read lock.

pub mod metrics_impl;
pub mod snapshot;

pub use metrics_impl::LruMetrics;
pub use snapshot::LruMetricsSnapshot;
