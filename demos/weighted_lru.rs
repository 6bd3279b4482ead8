use lrukit::builder::LruCacheBuilder;
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=lrukit=trace shows each eviction
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cache = LruCacheBuilder::<&'static str, String>::new(16)
        .weigher(|v| v.len() as u64)
        .weight_limit(12)
        .on_evicted(|k, v| println!("evicted {} ({} bytes)", k, v.len()))
        .build()
        .expect("positive size");

    cache.add("small", "abc".to_string());
    cache.add("medium", "abcdef".to_string());
    cache.add("large", "abcdefgh".to_string());

    println!("keys: {:?}", cache.keys());
    println!("weight: {}/{}", cache.weight_total(), cache.weight_limit());

    let (previous, evicted) = cache.get_or_add("large", "ignored".to_string());
    println!("get_or_add hit: {:?}, evicted: {}", previous, evicted);
}

// Expected output:
// evicted small (3 bytes)
// evicted medium (6 bytes)
// keys: ["large"]
// weight: 8/12
// get_or_add hit: Some("abcdefgh"), evicted: false
