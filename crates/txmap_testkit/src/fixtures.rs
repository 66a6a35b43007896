//! Map fixtures.
//!
//! Provides maps with predictable contents for tests and benchmarks.

use std::collections::BTreeMap;
use txmap_core::{MapConfig, TransactionalMap};

/// Returns the fixture key for index `i` (`key0000`, `key0001`, ...).
pub fn fixture_key(i: usize) -> String {
    format!("key{i:04}")
}

/// Returns the fixture value for index `i`.
pub fn fixture_value(i: usize) -> String {
    format!("value{i}")
}

/// Creates a map holding `count` fixture entries.
pub fn seeded_map(count: usize) -> TransactionalMap<String, String> {
    seeded_map_with_config(count, MapConfig::new().name("fixture"))
}

/// Creates a map holding `count` fixture entries, with `config`.
pub fn seeded_map_with_config(count: usize, config: MapConfig) -> TransactionalMap<String, String> {
    let entries: BTreeMap<_, _> = (0..count)
        .map(|i| (fixture_key(i), fixture_value(i)))
        .collect();
    TransactionalMap::with_entries(config, entries)
}

/// Creates a map from borrowed string pairs.
pub fn string_map(entries: &[(&str, &str)]) -> TransactionalMap<String, String> {
    TransactionalMap::from_entries(
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
    )
}

/// Runs a test against a fresh map holding `count` fixture entries.
///
/// # Example
///
/// ```rust
/// use txmap_testkit::with_seeded_map;
///
/// with_seeded_map(2, |map| {
///     assert_eq!(map.len(), 2);
/// });
/// ```
pub fn with_seeded_map<F, R>(count: usize, f: F) -> R
where
    F: FnOnce(&TransactionalMap<String, String>) -> R,
{
    let map = seeded_map(count);
    f(&map)
}

/// Returns the committed entries as owned pairs, in key order.
pub fn committed_pairs<K: Ord + Clone, V: Clone>(map: &TransactionalMap<K, V>) -> Vec<(K, V)> {
    map.snapshot().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_map_has_predictable_contents() {
        let map = seeded_map(3);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("key0002"), Some("value2".to_string()));
        assert_eq!(map.config().name, "fixture");
    }

    #[test]
    fn string_map_and_pairs() {
        let map = string_map(&[("b", "2"), ("a", "1")]);
        assert_eq!(
            committed_pairs(&map),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn with_seeded_map_returns_closure_result() {
        let len = with_seeded_map(5, |map| map.len());
        assert_eq!(len, 5);
    }
}
