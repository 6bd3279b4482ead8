use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics::snapshot::LruMetricsSnapshot;

/// Counters recorded by [`LruCore`](crate::policy::lru::LruCore).
#[derive(Debug, Default)]
pub struct LruMetrics {
    get_hits: AtomicU64,
    get_misses: AtomicU64,
    peek_calls: AtomicU64,
    peek_hits: AtomicU64,
    insert_new: AtomicU64,
    insert_updates: AtomicU64,
    evict_calls: AtomicU64,
    evicted_entries: AtomicU64,
    removes: AtomicU64,
    purges: AtomicU64,
    purged_entries: AtomicU64,
}

#[inline]
fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl LruMetrics {
    pub fn record_get_hit(&self) {
        bump(&self.get_hits, 1);
    }

    pub fn record_get_miss(&self) {
        bump(&self.get_misses, 1);
    }

    pub fn record_peek(&self, found: bool) {
        bump(&self.peek_calls, 1);
        if found {
            bump(&self.peek_hits, 1);
        }
    }

    pub fn record_insert_new(&self) {
        bump(&self.insert_new, 1);
    }

    pub fn record_insert_update(&self) {
        bump(&self.insert_updates, 1);
    }

    /// One eviction check that removed `evicted` entries (possibly zero).
    pub fn record_evict_check(&self, evicted: usize) {
        bump(&self.evict_calls, 1);
        bump(&self.evicted_entries, evicted as u64);
    }

    pub fn record_remove(&self) {
        bump(&self.removes, 1);
    }

    pub fn record_purge(&self, entries: usize) {
        bump(&self.purges, 1);
        bump(&self.purged_entries, entries as u64);
    }

    /// Copies the counters out together with the engine's current shape.
    pub fn snapshot(
        &self,
        len: usize,
        capacity: usize,
        weight_total: u64,
        weight_limit: u64,
    ) -> LruMetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        LruMetricsSnapshot {
            get_hits: load(&self.get_hits),
            get_misses: load(&self.get_misses),
            peek_calls: load(&self.peek_calls),
            peek_hits: load(&self.peek_hits),
            insert_new: load(&self.insert_new),
            insert_updates: load(&self.insert_updates),
            evict_calls: load(&self.evict_calls),
            evicted_entries: load(&self.evicted_entries),
            removes: load(&self.removes),
            purges: load(&self.purges),
            purged_entries: load(&self.purged_entries),
            cache_len: len,
            capacity,
            weight_total,
            weight_limit,
        }
    }
}
