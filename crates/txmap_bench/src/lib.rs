//! Benchmark utilities.

use rand::Rng;
use txmap_core::TransactionalMap;

/// Map type used by the benchmarks.
pub type BenchMap = TransactionalMap<u64, u64>;

/// Generate `count` random keys below `range`.
pub fn random_keys(count: usize, range: u64) -> Vec<u64> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(0..range)).collect()
}

/// Generate `count` random key/value pairs with keys below `range`.
pub fn random_entries(count: usize, range: u64) -> Vec<(u64, u64)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| (rng.gen_range(0..range), rng.gen()))
        .collect()
}

/// Create a map holding keys `0..size`.
pub fn populated_map(size: u64) -> BenchMap {
    TransactionalMap::from_entries((0..size).map(|k| (k, k * 2)))
}
