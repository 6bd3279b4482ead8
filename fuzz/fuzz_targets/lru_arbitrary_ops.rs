#![no_main]

use libfuzzer_sys::fuzz_target;
use lrukit::policy::lru::LruCore;
use lrukit::traits::FnListener;

// Arbitrary operation sequences on a weighted LruCore. Checks the bounds, the
// weight total and index/list agreement after every step, and that every
// removal reaches the listener exactly once.
fuzz_target!(|data: &[u8]| {
    let Some((&size, data)) = data.split_first() else {
        return;
    };
    let size = usize::from(size % 32) + 1;

    let mut notified = 0usize;
    let mut inserted = 0usize;
    {
        let mut cache = LruCore::with_weight_limit(
            size,
            200,
            Some(Box::new(|v: &u8| u64::from(*v))),
            FnListener(|_k: u8, _v: u8| notified += 1),
        )
        .unwrap();

        for chunk in data.chunks_exact(3) {
            let (op, key, value) = (chunk[0] % 9, chunk[1] % 64, chunk[2]);
            match op {
                0 | 1 => {
                    if !cache.contains(&key) {
                        inserted += 1;
                    }
                    cache.add(key, value);
                },
                2 => {
                    let _ = cache.get(&key);
                },
                3 => {
                    let before = cache.keys();
                    let _ = cache.peek(&key);
                    assert_eq!(cache.keys(), before);
                },
                4 => {
                    let _ = cache.remove(&key);
                },
                5 => {
                    let oldest = cache.get_oldest().map(|(k, v)| (*k, *v));
                    assert_eq!(cache.remove_oldest(), oldest);
                },
                6 => {
                    cache.resize(usize::from(value % 32) + 1);
                },
                7 => {
                    cache.reset_weight_limit(u64::from(value) * 4);
                },
                8 => {
                    if value == 0 {
                        cache.purge();
                        assert!(cache.is_empty());
                    }
                },
                _ => unreachable!(),
            }

            assert!(cache.len() <= cache.capacity());
            assert!(cache.weight_total() <= cache.weight_limit());
            cache.check_invariants().unwrap();
        }

        inserted -= cache.len();
    }
    assert_eq!(notified, inserted);
});
