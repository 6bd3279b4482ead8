/// Point-in-time copy of [`LruMetrics`](crate::metrics::LruMetrics).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LruMetricsSnapshot {
    pub get_hits: u64,
    pub get_misses: u64,
    pub peek_calls: u64,
    pub peek_hits: u64,

    pub insert_new: u64,
    pub insert_updates: u64,

    pub evict_calls: u64,
    pub evicted_entries: u64,
    pub removes: u64,
    pub purges: u64,
    pub purged_entries: u64,

    pub cache_len: usize,
    pub capacity: usize,
    pub weight_total: u64,
    pub weight_limit: u64,
}

impl LruMetricsSnapshot {
    /// Fraction of `get` calls that hit, or `0.0` before any `get`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.get_hits + self.get_misses;
        if total == 0 {
            0.0
        } else {
            self.get_hits as f64 / total as f64
        }
    }
}
