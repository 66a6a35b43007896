//! Transaction staging state.

use crate::types::MergeSummary;
use crate::view::MergedIter;
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

/// Staged changes of one transaction, overlaid on the base store.
///
/// The context never owns the base. Every operation that needs committed
/// state takes it as a borrowed `base` argument, so the caller decides which
/// lock protects it.
///
/// # Invariants
///
/// - `pending` and `tombstones` are disjoint.
/// - `new_keys` holds exactly the staged keys that are absent from the base
///   (the base cannot change while the transaction is active).
/// - When `cleared` is set, the base is hidden: only `pending` is visible.
#[derive(Debug, Clone)]
pub struct TransactionContext<K, V> {
    /// Staged upserts.
    pending: BTreeMap<K, V>,
    /// Keys staged for removal.
    tombstones: BTreeSet<K>,
    /// Staged keys that the base does not contain.
    new_keys: BTreeSet<K>,
    /// The base is logically empty beneath this context.
    cleared: bool,
    /// Anything at all was staged; merge is a no-op otherwise.
    dirty: bool,
}

impl<K: Ord, V> Default for TransactionContext<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> TransactionContext<K, V> {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            tombstones: BTreeSet::new(),
            new_keys: BTreeSet::new(),
            cleared: false,
            dirty: false,
        }
    }

    /// Returns true if the base is hidden by a staged `clear`.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Returns true if any change was staged.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the number of staged upserts.
    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns the number of staged removals.
    #[must_use]
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    pub(crate) fn pending(&self) -> &BTreeMap<K, V> {
        &self.pending
    }

    pub(crate) fn is_tombstoned<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tombstones.contains(key)
    }

    /// Returns the number of entries visible through this context.
    pub fn len(&self, base: &BTreeMap<K, V>) -> usize {
        if self.cleared {
            return self.pending.len();
        }
        let hidden = self
            .tombstones
            .iter()
            .filter(|key| base.contains_key(*key))
            .count();
        base.len() + self.new_keys.len() - hidden
    }

    /// Returns true if no entry is visible through this context.
    pub fn is_empty(&self, base: &BTreeMap<K, V>) -> bool {
        self.len(base) == 0
    }

    /// Returns the effective value for `key`.
    pub fn get<'a, Q>(&'a self, key: &Q, base: &'a BTreeMap<K, V>) -> Option<&'a V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.tombstones.contains(key) {
            return None;
        }
        if let Some(value) = self.pending.get(key) {
            return Some(value);
        }
        if self.cleared {
            None
        } else {
            base.get(key)
        }
    }

    /// Returns true if `key` has an effective value.
    pub fn contains_key<Q>(&self, key: &Q, base: &BTreeMap<K, V>) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key, base).is_some()
    }

    /// Returns true if any visible entry holds `value`.
    ///
    /// This scans every visible entry.
    pub fn contains_value(&self, value: &V, base: &BTreeMap<K, V>) -> bool
    where
        V: PartialEq,
    {
        self.iter(base).any(|(_, candidate)| candidate == value)
    }

    /// Iterates the visible entries: staged entries first, then base
    /// entries that are neither tombstoned nor shadowed by a staged entry.
    pub fn iter<'a>(&'a self, base: &'a BTreeMap<K, V>) -> MergedIter<'a, K, V> {
        MergedIter::new(self, base)
    }

    /// Hides the whole base and drops everything staged so far.
    pub fn clear(&mut self) {
        self.dirty = true;
        self.cleared = true;
        self.pending.clear();
        self.tombstones.clear();
        self.new_keys.clear();
    }

    /// Applies the staged changes to `base`.
    ///
    /// The caller must hold `base` exclusively for the whole call so that
    /// no reader observes a partially merged state.
    pub fn merge_into(self, base: &mut BTreeMap<K, V>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        if !self.dirty {
            return summary;
        }

        if self.cleared {
            base.clear();
            summary.cleared = true;
        }
        for key in &self.tombstones {
            if base.remove(key).is_some() {
                summary.removed += 1;
            }
        }
        summary.upserted = self.pending.len();
        base.extend(self.pending);
        summary
    }
}

impl<K: Ord + Clone, V: Clone> TransactionContext<K, V> {
    /// Stages `value` under `key` and returns the previous effective value.
    pub fn put(&mut self, key: K, value: V, base: &BTreeMap<K, V>) -> Option<V> {
        self.dirty = true;
        let was_tombstoned = self.tombstones.remove(&key);
        if !base.contains_key(&key) {
            self.new_keys.insert(key.clone());
        }

        let hidden = was_tombstoned || self.cleared || self.pending.contains_key(&key);
        let from_base = if hidden { None } else { base.get(&key).cloned() };
        self.pending.insert(key, value).or(from_base)
    }

    /// Stages the removal of `key` and returns the previous effective value.
    pub fn remove<Q>(&mut self, key: &Q, base: &BTreeMap<K, V>) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized + ToOwned<Owned = K>,
    {
        self.dirty = true;
        let was_tombstoned = !self.tombstones.insert(key.to_owned());
        self.new_keys.remove(key);

        if let Some(previous) = self.pending.remove(key) {
            return Some(previous);
        }
        if was_tombstoned || self.cleared {
            None
        } else {
            base.get(key).cloned()
        }
    }
}
