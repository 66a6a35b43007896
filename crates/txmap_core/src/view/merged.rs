//! Views that overlay a transaction context on the base store.

use crate::error::{MapError, MapResult};
use crate::transaction::TransactionContext;
use crate::view::range_after;
use parking_lot::RwLockReadGuard;
use std::borrow::Borrow;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Lazy iterator over the entries visible through a transaction context.
///
/// Staged entries come first (minus tombstones), then base entries that are
/// neither tombstoned nor already produced from the staged set. Base entries
/// are skipped entirely once the context has been cleared.
pub struct MergedIter<'a, K, V> {
    context: &'a TransactionContext<K, V>,
    staged: btree_map::Iter<'a, K, V>,
    base: Option<btree_map::Iter<'a, K, V>>,
}

impl<'a, K: Ord, V> MergedIter<'a, K, V> {
    pub(crate) fn new(context: &'a TransactionContext<K, V>, base: &'a BTreeMap<K, V>) -> Self {
        Self {
            context,
            staged: context.pending().iter(),
            base: (!context.is_cleared()).then(|| base.iter()),
        }
    }
}

impl<'a, K: Ord, V> Iterator for MergedIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let context = self.context;
        for (key, value) in self.staged.by_ref() {
            if !context.is_tombstoned(key) {
                return Some((key, value));
            }
        }
        self.base
            .as_mut()?
            .find(|(key, _)| !context.is_tombstoned(*key) && !context.pending().contains_key(*key))
    }
}

/// Read-only view of the entries visible to the transaction owner.
///
/// Holds a shared lock on the base store for its lifetime.
pub struct MergedView<'a, K, V> {
    context: &'a TransactionContext<K, V>,
    base: RwLockReadGuard<'a, BTreeMap<K, V>>,
}

impl<'a, K: Ord, V> MergedView<'a, K, V> {
    pub(crate) fn new(
        context: &'a TransactionContext<K, V>,
        base: RwLockReadGuard<'a, BTreeMap<K, V>>,
    ) -> Self {
        Self { context, base }
    }

    /// Iterates the visible entries.
    pub fn iter(&self) -> MergedIter<'_, K, V> {
        self.context.iter(&self.base)
    }

    /// Iterates the visible keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates the visible values.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Returns the number of visible entries.
    pub fn len(&self) -> usize {
        self.context.len(&self.base)
    }

    /// Returns true if no entry is visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the visible value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.context.get(key, &self.base)
    }

    /// Returns true if `key` is visible.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.context.contains_key(key, &self.base)
    }

    /// Returns true if any visible entry holds `value`. Scans every entry.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.context.contains_value(value, &self.base)
    }
}

impl<'v, 'a, K: Ord, V> IntoIterator for &'v MergedView<'a, K, V> {
    type Item = (&'v K, &'v V);
    type IntoIter = MergedIter<'v, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Mutable view of the entries visible to the transaction owner.
///
/// Removals and clears made through this view are staged in the
/// transaction, exactly as if they were made through the handle.
pub struct MergedViewMut<'a, K, V> {
    context: &'a mut TransactionContext<K, V>,
    base: RwLockReadGuard<'a, BTreeMap<K, V>>,
}

impl<'a, K: Ord + Clone, V: Clone> MergedViewMut<'a, K, V> {
    pub(crate) fn new(
        context: &'a mut TransactionContext<K, V>,
        base: RwLockReadGuard<'a, BTreeMap<K, V>>,
    ) -> Self {
        Self { context, base }
    }

    /// Iterates the visible entries.
    pub fn iter(&self) -> MergedIter<'_, K, V> {
        self.context.iter(&self.base)
    }

    /// Returns the number of visible entries.
    pub fn len(&self) -> usize {
        self.context.len(&self.base)
    }

    /// Returns true if no entry is visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `key` is visible.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.context.contains_key(key, &self.base)
    }

    /// Iterates the visible keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates the visible values.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Returns the visible value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.context.get(key, &self.base)
    }

    /// Returns true if any visible entry holds `value`. Scans every entry.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.context.contains_value(value, &self.base)
    }

    /// Stages the removal of `key`, returning its previous visible value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized + ToOwned<Owned = K>,
    {
        self.context.remove(key, &self.base)
    }

    /// Stages the removal of every visible entry for which `keep` is false.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .context
            .iter(&self.base)
            .filter(|(key, value)| !keep(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.context.remove(key, &self.base);
        }
    }

    /// Stages a clear of the whole map.
    pub fn clear(&mut self) {
        self.context.clear();
    }

    /// Returns a cursor that can remove entries while walking the view.
    pub fn cursor(&mut self) -> MergedCursor<'_, K, V> {
        MergedCursor::new(self.context, &self.base)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Staged,
    Base,
    Done,
}

/// Walks the owner's visible entries and can remove the current one.
///
/// The walk is non-restartable and visits entries in the same order as
/// [`MergedIter`].
pub struct MergedCursor<'a, K, V> {
    context: &'a mut TransactionContext<K, V>,
    base: &'a BTreeMap<K, V>,
    phase: Phase,
    /// Last key produced in the current phase.
    position: Option<K>,
    /// Key that `remove_current` would remove.
    current: Option<K>,
}

impl<'a, K: Ord + Clone, V: Clone> MergedCursor<'a, K, V> {
    fn new(context: &'a mut TransactionContext<K, V>, base: &'a BTreeMap<K, V>) -> Self {
        Self {
            context,
            base,
            phase: Phase::Staged,
            position: None,
            current: None,
        }
    }

    /// Moves to the next visible entry and returns it.
    pub fn advance(&mut self) -> Option<(&K, &V)> {
        self.current = None;
        loop {
            let context = &*self.context;
            let next = match self.phase {
                Phase::Staged => range_after(context.pending(), self.position.as_ref())
                    .map(|(key, _)| key)
                    .find(|key| !context.is_tombstoned(*key))
                    .cloned(),
                Phase::Base => range_after(self.base, self.position.as_ref())
                    .map(|(key, _)| key)
                    .find(|key| !context.is_tombstoned(*key) && !context.pending().contains_key(*key))
                    .cloned(),
                Phase::Done => return None,
            };

            match next {
                Some(key) => {
                    self.position = Some(key.clone());
                    self.current = Some(key);
                    break;
                }
                None => {
                    self.position = None;
                    self.phase = match self.phase {
                        Phase::Staged if !context.is_cleared() => Phase::Base,
                        _ => Phase::Done,
                    };
                }
            }
        }

        let key = self.current.as_ref()?;
        match self.phase {
            Phase::Staged => self.context.pending().get_key_value(key),
            _ => self.base.get_key_value(key),
        }
    }

    /// Stages the removal of the entry last returned by [`advance`].
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidIteratorState`] if `advance` has not
    /// produced an entry yet, or if the current entry was already removed.
    ///
    /// [`advance`]: Self::advance
    pub fn remove_current(&mut self) -> MapResult<()> {
        let key = self.current.take().ok_or_else(|| {
            MapError::invalid_iterator_state("remove_current called without a current entry")
        })?;
        self.context.remove(&key, self.base);
        Ok(())
    }
}
