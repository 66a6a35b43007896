//! The committed base store.

use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;

/// The canonical, committed key-value state shared by every caller.
///
/// The store itself knows nothing about transactions. The facade decides who
/// may take the write lock: direct writers while no transaction is active,
/// and the owning transaction during commit.
#[derive(Debug)]
pub struct BaseStore<K, V> {
    entries: RwLock<BTreeMap<K, V>>,
}

impl<K: Ord, V> Default for BaseStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> BaseStore<K, V> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_entries(BTreeMap::new())
    }

    /// Creates a store with pre-existing entries.
    #[must_use]
    pub fn with_entries(entries: BTreeMap<K, V>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Acquires shared access to the committed entries.
    pub fn read(&self) -> RwLockReadGuard<'_, BTreeMap<K, V>> {
        self.entries.read()
    }

    /// Acquires shared access that can later be upgraded to exclusive.
    ///
    /// Plain readers proceed alongside the guard; only one upgradable guard
    /// exists at a time.
    pub fn upgradable_read(&self) -> RwLockUpgradableReadGuard<'_, BTreeMap<K, V>> {
        self.entries.upgradable_read()
    }

    /// Acquires exclusive access to the committed entries.
    pub fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<K, V>> {
        self.entries.write()
    }

    /// Returns the number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K: Ord + Clone, V: Clone> BaseStore<K, V> {
    /// Returns a copy of all committed entries.
    pub fn snapshot(&self) -> BTreeMap<K, V> {
        self.entries.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_empty() {
        let store: BaseStore<u32, u32> = BaseStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn writes_are_visible_to_readers() {
        let store = BaseStore::new();
        store.write().insert("a", 1);
        assert_eq!(store.read().get("a"), Some(&1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn upgradable_guard_admits_readers() {
        let store = BaseStore::with_entries(BTreeMap::from([(1, "one")]));
        let mut guard = store.upgradable_read();

        assert_eq!(store.read().get(&1), Some(&"one"));
        RwLockUpgradableReadGuard::with_upgraded(&mut guard, |entries| entries.insert(2, "two"));
        assert_eq!(guard.len(), 2);
        drop(guard);

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn snapshot_is_detached() {
        let store = BaseStore::with_entries(BTreeMap::from([(1, "one")]));
        let snap = store.snapshot();
        store.write().clear();

        assert_eq!(snap.get(&1), Some(&"one"));
        assert!(store.is_empty());
    }
}
