use lrukit::policy::lru::LruCore;

fn main() {
    let mut cache: LruCore<u32, String> = LruCore::new(2).expect("positive size");

    cache.add(1, "alpha".to_string());
    cache.add(2, "beta".to_string());

    if let Some(value) = cache.get(&1) {
        println!("hit 1: {}", value);
    }

    cache.add(3, "gamma".to_string());

    println!("contains 2? {}", cache.contains(&2));
    println!("keys: {:?}", cache.keys());
}

// Expected output:
// hit 1: alpha
// contains 2? false
// keys: [1, 3]
//
// Explanation: capacity=2; after get(&1), key 1 is MRU and key 2 is LRU.
// Adding key 3 evicts key 2.
