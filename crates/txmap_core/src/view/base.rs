//! Views over the committed entries, handed to callers that do not own the
//! active transaction.

use crate::error::{MapError, MapResult};
use crate::stats::MapStats;
use crate::types::TransactionId;
use crate::view::range_after;
use parking_lot::{MutexGuard, RwLockUpgradableReadGuard};
use std::borrow::Borrow;
use std::collections::btree_map;
use std::collections::BTreeMap;

type EntriesGuard<'a, K, V> = RwLockUpgradableReadGuard<'a, BTreeMap<K, V>>;

/// View of the base store while no transaction is active.
///
/// The view holds the transaction slot, so `begin_transaction` and direct
/// writes wait until it is dropped. Reads from any thread, including the
/// holder's, proceed alongside it. Mutations through the view take the
/// store exclusively only for their own duration. The holder must not write
/// through the map while the view is alive.
pub struct LiveView<'a, K, V> {
    // Declared before the slot guard so the store lock is released first.
    entries: EntriesGuard<'a, K, V>,
    stats: &'a MapStats,
    _slot: MutexGuard<'a, Option<TransactionId>>,
}

impl<'a, K: Ord, V> LiveView<'a, K, V> {
    pub(crate) fn new(
        slot: MutexGuard<'a, Option<TransactionId>>,
        entries: EntriesGuard<'a, K, V>,
        stats: &'a MapStats,
    ) -> Self {
        Self {
            entries,
            stats,
            _slot: slot,
        }
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.stats.record_delete();
        RwLockUpgradableReadGuard::with_upgraded(&mut self.entries, |entries| {
            entries.remove(key)
        })
    }

    fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut removed = 0;
        RwLockUpgradableReadGuard::with_upgraded(&mut self.entries, |entries| {
            entries.retain(|key, value| {
                let kept = keep(key, value);
                if !kept {
                    removed += 1;
                }
                kept
            });
        });
        self.stats.record_deletes(removed);
    }

    fn clear(&mut self) {
        self.stats.record_clear();
        RwLockUpgradableReadGuard::with_upgraded(&mut self.entries, BTreeMap::clear);
    }
}

/// Detached copy of the committed entries, taken while another caller's
/// transaction was active.
///
/// Reads never observe that transaction's staged changes. Writes through
/// the snapshot are rejected.
#[derive(Debug, Clone)]
pub struct SnapshotView<K, V> {
    entries: BTreeMap<K, V>,
    owner: TransactionId,
}

impl<K, V> SnapshotView<K, V> {
    pub(crate) fn new(entries: BTreeMap<K, V>, owner: TransactionId) -> Self {
        Self { entries, owner }
    }

    /// Returns the transaction that was active when the snapshot was taken.
    pub fn owner(&self) -> TransactionId {
        self.owner
    }

    /// Consumes the snapshot and returns its entries.
    pub fn into_entries(self) -> BTreeMap<K, V> {
        self.entries
    }
}

/// A non-owner's view of the committed entries.
pub enum BaseView<'a, K, V> {
    /// No transaction was active; the view reads and writes the store directly.
    Live(LiveView<'a, K, V>),
    /// A transaction was active; the view is a read-only copy.
    Snapshot(SnapshotView<K, V>),
}

impl<'a, K: Ord, V> BaseView<'a, K, V> {
    fn entries(&self) -> &BTreeMap<K, V> {
        match self {
            Self::Live(live) => &*live.entries,
            Self::Snapshot(snapshot) => &snapshot.entries,
        }
    }

    fn live(&mut self) -> MapResult<&mut LiveView<'a, K, V>> {
        match self {
            Self::Live(live) => Ok(live),
            Self::Snapshot(snapshot) => Err(MapError::write_rejected(snapshot.owner)),
        }
    }

    /// Returns true if the view writes through to the store.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// Iterates the entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.entries().iter()
    }

    /// Iterates the keys in order.
    pub fn keys(&self) -> btree_map::Keys<'_, K, V> {
        self.entries().keys()
    }

    /// Iterates the values in key order.
    pub fn values(&self) -> btree_map::Values<'_, K, V> {
        self.entries().values()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns true if the view has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Returns the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries().get(key)
    }

    /// Returns true if `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries().contains_key(key)
    }

    /// Returns true if any entry holds `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|candidate| candidate == value)
    }

    /// Removes `key` from the store.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] on a snapshot.
    pub fn remove<Q>(&mut self, key: &Q) -> MapResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Ok(self.live()?.remove(key))
    }

    /// Removes every entry for which `keep` returns false.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] on a snapshot.
    pub fn retain<F>(&mut self, keep: F) -> MapResult<()>
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.live()?.retain(keep);
        Ok(())
    }

    /// Removes every entry from the store.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] on a snapshot.
    pub fn clear(&mut self) -> MapResult<()> {
        self.live()?.clear();
        Ok(())
    }

    /// Returns a cursor that can remove entries while walking the store.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] on a snapshot.
    pub fn cursor(&mut self) -> MapResult<BaseCursor<'_, 'a, K, V>> {
        let live = self.live()?;
        Ok(BaseCursor::new(&mut live.entries, live.stats))
    }
}

impl<'v, 'a, K: Ord, V> IntoIterator for &'v BaseView<'a, K, V> {
    type Item = (&'v K, &'v V);
    type IntoIter = btree_map::Iter<'v, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Walks the committed entries in key order and can remove the current one.
///
/// Only [`remove_current`](Self::remove_current) takes the store
/// exclusively; walking shares it with other readers.
pub struct BaseCursor<'c, 'a, K, V> {
    entries: &'c mut EntriesGuard<'a, K, V>,
    stats: &'c MapStats,
    position: Option<K>,
    current: bool,
}

impl<'c, 'a, K, V> BaseCursor<'c, 'a, K, V> {
    fn new(entries: &'c mut EntriesGuard<'a, K, V>, stats: &'c MapStats) -> Self {
        Self {
            entries,
            stats,
            position: None,
            current: false,
        }
    }
}

impl<'c, 'a, K: Ord + Clone, V> BaseCursor<'c, 'a, K, V> {
    /// Moves to the next entry and returns it.
    pub fn advance(&mut self) -> Option<(&K, &V)> {
        self.current = false;
        let (key, value) = range_after(&**self.entries, self.position.as_ref()).next()?;
        self.position = Some(key.clone());
        self.current = true;
        Some((key, value))
    }

    /// Removes the entry last returned by [`advance`](Self::advance).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidIteratorState`] if there is no current
    /// entry, either because `advance` has not produced one or because it
    /// was already removed.
    pub fn remove_current(&mut self) -> MapResult<()> {
        let key = match (&self.position, self.current) {
            (Some(key), true) => key,
            _ => {
                return Err(MapError::invalid_iterator_state(
                    "remove_current called without a current entry",
                ))
            }
        };
        RwLockUpgradableReadGuard::with_upgraded(&mut *self.entries, |entries| entries.remove(key));
        self.stats.record_delete();
        self.current = false;
        Ok(())
    }
}
