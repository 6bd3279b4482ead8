// ==============================================
// LRU CONCURRENCY TESTS (integration)
// ==============================================
#![cfg(feature = "concurrency")]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, OnceLock};
use std::thread;

use lrukit::builder::LruCacheBuilder;
use lrukit::policy::concurrent_lru::ConcurrentLruCache;

type Log<K, V> = Arc<Mutex<Vec<(K, V)>>>;

fn logged_cache(size: usize) -> (ConcurrentLruCache<u64, u64>, Log<u64, u64>) {
    let log: Log<u64, u64> = Arc::default();
    let sink = Arc::clone(&log);
    let cache = ConcurrentLruCache::with_evict(size, move |k: u64, v: u64| {
        sink.lock().unwrap().push((k, v));
    })
    .unwrap();
    (cache, log)
}

// ==============================================
// COMPOUND OPERATIONS
// ==============================================
mod compound_atomicity {
    use super::*;

    #[test]
    fn test_get_or_add_single_winner() {
        for _ in 0..20 {
            let cache: ConcurrentLruCache<&'static str, usize> =
                ConcurrentLruCache::new(16).unwrap();
            let num_threads = 8;
            let barrier = Arc::new(Barrier::new(num_threads));
            let misses = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..num_threads)
                .map(|thread_id| {
                    let cache = cache.clone();
                    let barrier = Arc::clone(&barrier);
                    let misses = Arc::clone(&misses);
                    thread::spawn(move || {
                        barrier.wait();
                        let (previous, _) = cache.get_or_add("shared", thread_id);
                        if previous.is_none() {
                            misses.fetch_add(1, Ordering::SeqCst);
                        }
                        previous
                    })
                })
                .collect();

            let seen: Vec<Option<usize>> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(misses.load(Ordering::SeqCst), 1);

            // every hit returned the winner's value
            let stored = cache.peek(&"shared").unwrap();
            assert!(seen.iter().flatten().all(|v| *v == stored));
        }
    }

    #[test]
    fn test_contains_or_add_single_insert() {
        let cache: ConcurrentLruCache<u64, u64> = ConcurrentLruCache::new(64).unwrap();
        let num_threads = 8;
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads as u64)
            .map(|t| {
                let cache = cache.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    (0..32u64)
                        .filter(|k| !cache.contains_or_add(*k, t).0)
                        .count()
                })
            })
            .collect();

        let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(inserted, 32);
        assert_eq!(cache.len(), 32);
    }
}

// ==============================================
// CALLBACK DELIVERY
// ==============================================
mod callback_delivery {
    use super::*;

    #[test]
    fn test_every_entry_reported_exactly_once() {
        let (cache, log) = logged_cache(32);
        let num_threads = 8;
        let per_thread = 500u64;

        let handles: Vec<_> = (0..num_threads as u64)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let key = t * 10_000 + i;
                        cache.add(key, key);
                        if i % 7 == 0 {
                            cache.remove(&key);
                        }
                        if i % 11 == 0 {
                            let _ = cache.get(&(key.saturating_sub(3)));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let survivors = cache.keys();
        cache.purge();
        assert!(cache.is_empty());

        let reported = log.lock().unwrap().clone();
        let unique: HashSet<u64> = reported.iter().map(|(k, _)| *k).collect();
        assert_eq!(unique.len(), reported.len(), "a key was reported twice");
        assert_eq!(reported.len(), num_threads * per_thread as usize);
        assert!(reported.iter().all(|(k, v)| k == v));
        assert!(survivors.iter().all(|k| unique.contains(k)));
    }

    #[test]
    fn test_callback_runs_without_lock() {
        static CACHE: OnceLock<ConcurrentLruCache<u64, u64>> = OnceLock::new();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);

        let cache = CACHE.get_or_init(|| {
            ConcurrentLruCache::with_evict(2, move |k: u64, _v: u64| {
                let Some(cache) = CACHE.get() else {
                    return;
                };
                // a write lock here would deadlock if the caller still held one
                cache.resize(cache.capacity());
                sink.lock().unwrap().push((k, cache.len(), cache.keys()));
            })
            .unwrap()
        });

        cache.add(1, 1);
        cache.add(2, 2);
        cache.add(3, 3);
        cache.remove(&2);

        let observed = observed.lock().unwrap().clone();
        assert_eq!(observed, vec![(1, 2, vec![2, 3]), (2, 1, vec![3])]);
    }

    #[test]
    fn test_bulk_and_single_drains_match() {
        let (bulk, bulk_log) = logged_cache(8);
        let (single, single_log) = logged_cache(8);
        for k in 0..8u64 {
            bulk.add(k, k * 10);
            single.add(k, k * 10);
        }

        // one resize drains the whole buffer at once
        assert_eq!(bulk.resize(3), 5);
        // the same evictions, one per call
        for _ in 0..5 {
            single.resize(single.len() - 1);
        }

        assert_eq!(*bulk_log.lock().unwrap(), *single_log.lock().unwrap());
        assert_eq!(bulk.keys(), single.keys());
        assert_eq!(bulk.keys(), vec![5, 6, 7]);
    }
}

// ==============================================
// MIXED WORKLOAD
// ==============================================
mod mixed_workload {
    use super::*;

    #[test]
    fn test_weight_bound_holds_under_contention() {
        let evictions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evictions);
        let cache = LruCacheBuilder::<u64, Vec<u8>>::new(256)
            .weigher(|v| v.len() as u64)
            .weight_limit(1_000)
            .on_evicted(move |_, _| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .build()
            .unwrap();

        let handles: Vec<_> = (0..6u64)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..400u64 {
                        let key = (t * 31 + i) % 300;
                        match i % 5 {
                            0 => {
                                cache.add(key, vec![0; (i % 40) as usize]);
                            },
                            1 => {
                                let _ = cache.get(&key);
                            },
                            2 => {
                                let _ = cache.peek_or_add(key, vec![1; 8]);
                            },
                            3 => {
                                let _ = cache.get_oldest();
                            },
                            _ => {
                                assert!(cache.weight_total() <= 1_000);
                                assert!(cache.len() <= 256);
                            },
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.weight_total() <= 1_000);
        assert!(cache.len() <= 256);
        let expected: u64 = cache
            .keys()
            .iter()
            .filter_map(|k| cache.peek(k))
            .map(|v| v.len() as u64)
            .sum();
        assert_eq!(cache.weight_total(), expected);
    }

    #[test]
    fn test_readers_and_writers_interleave() {
        let cache: ConcurrentLruCache<u64, u64> = ConcurrentLruCache::new(128).unwrap();
        for i in 0..128 {
            cache.add(i, i);
        }

        let writer = {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 128..2_000u64 {
                    cache.add(i, i);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let keys = cache.keys();
                        assert!(keys.len() <= 128);
                        if let Some((k, v)) = cache.get_oldest() {
                            assert_eq!(k, v);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.len(), 128);
        assert_eq!(cache.keys(), (1_872..2_000).collect::<Vec<_>>());
    }
}
