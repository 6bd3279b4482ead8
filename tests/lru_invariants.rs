// ==============================================
// LRU INVARIANT TESTS (integration)
// ==============================================
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lrukit::builder::LruCacheBuilder;
use lrukit::policy::lru::LruCore;
use lrukit::traits::FnListener;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Sink = Rc<RefCell<Vec<(u32, u32)>>>;

fn weighted_core(
    size: usize,
    limit: u64,
) -> (LruCore<u32, u32, FnListener<impl FnMut(u32, u32)>>, Sink) {
    let sink: Sink = Rc::default();
    let inner = Rc::clone(&sink);
    let core = LruCacheBuilder::new(size)
        .weigher(|v: &u32| u64::from(*v))
        .weight_limit(limit)
        .build_core(FnListener(move |k: u32, v: u32| inner.borrow_mut().push((k, v))))
        .unwrap();
    (core, sink)
}

// ==============================================
// RANDOMIZED WORKLOADS
// ==============================================
mod randomized {
    use super::*;

    #[test]
    fn test_bounds_and_accounting_hold_for_random_workload() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let (mut cache, sink) = weighted_core(64, 500);
        // keys currently held, with their values
        let mut live: HashMap<u32, u32> = HashMap::new();

        for step in 0..20_000u32 {
            let key = rng.gen_range(0..256);
            match rng.gen_range(0..10) {
                0..=4 => {
                    let value = rng.gen_range(0..40);
                    cache.add(key, value);
                    live.insert(key, value);
                },
                5..=6 => {
                    let _ = cache.get(&key);
                },
                7 => {
                    if cache.remove(&key) {
                        live.remove(&key);
                    }
                },
                8 => {
                    let _ = cache.peek(&key);
                },
                _ => {
                    if step % 1_000 == 9 {
                        cache.resize(rng.gen_range(1..80));
                    }
                },
            }

            for (k, _) in sink.borrow_mut().drain(..) {
                live.remove(&k);
            }

            assert!(cache.len() <= cache.capacity());
            assert!(cache.weight_total() <= cache.weight_limit());
            assert_eq!(cache.len(), live.len());
            let expected: u64 = live.values().map(|v| u64::from(*v)).sum();
            assert_eq!(cache.weight_total(), expected);
            if step % 97 == 0 {
                cache.check_invariants().unwrap();
            }
        }
    }

    #[test]
    fn test_most_recent_touch_is_always_last() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cache: LruCore<u32, u32> = LruCore::new(16).unwrap();

        for _ in 0..5_000 {
            let key = rng.gen_range(0..32);
            let touched = if rng.gen_bool(0.5) {
                cache.add(key, key);
                Some(key)
            } else {
                cache.get(&key).map(|_| key)
            };
            if let Some(key) = touched {
                assert_eq!(cache.keys().last(), Some(&key));
            }
        }
    }
}

// ==============================================
// DOCUMENTED SCENARIOS
// ==============================================
mod scenarios {
    use super::*;

    #[test]
    fn test_weighted_eviction_picks_oldest() {
        let (mut cache, sink) = weighted_core(10, 10);
        cache.add(1, 6);
        assert!(cache.add(2, 6));
        assert_eq!(cache.weight_total(), 6);
        assert_eq!(cache.keys(), vec![2]);
        assert_eq!(*sink.borrow(), vec![(1, 6)]);
    }

    #[test]
    fn test_growing_update_evicts_other_key() {
        let (mut cache, sink) = weighted_core(10, 10);
        cache.add(1, 4);
        cache.add(2, 4);
        assert!(cache.add(2, 9));
        assert_eq!(cache.keys(), vec![2]);
        assert_eq!(cache.weight_total(), 9);
        assert_eq!(*sink.borrow(), vec![(1, 4)]);
    }

    #[test]
    fn test_purge_notifies_once_per_entry() {
        let (mut cache, sink) = weighted_core(8, 1_000);
        for k in 0..5 {
            cache.add(k, k + 1);
        }
        cache.purge();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.weight_total(), 0);
        assert!(cache.keys().is_empty());

        let mut seen = sink.borrow().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..5).map(|k| (k, k + 1)).collect::<Vec<_>>());

        cache.purge();
        assert_eq!(sink.borrow().len(), 5);
    }
}
