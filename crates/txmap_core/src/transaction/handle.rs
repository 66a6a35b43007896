//! The owner's handle on an active transaction.

use crate::error::{MapError, MapResult};
use crate::map::MapInner;
use crate::transaction::TransactionContext;
use crate::types::{MergeSummary, TransactionId};
use crate::view::{MergedView, MergedViewMut};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// An active transaction on a [`TransactionalMap`](crate::TransactionalMap).
///
/// Holding the handle is what makes a caller the owner: every operation on
/// the handle sees the transaction's staged changes, while operations on the
/// map itself see only committed state.
///
/// The handle is finished by [`commit`](Self::commit) or
/// [`abort`](Self::abort). After that every operation fails with
/// [`MapError::NoActiveTransaction`]. Dropping an unfinished handle aborts
/// the transaction.
///
/// ## Example
///
/// ```rust
/// use txmap_core::TransactionalMap;
///
/// let map: TransactionalMap<String, u32> = TransactionalMap::new();
/// let mut txn = map.begin_transaction().unwrap();
/// txn.put("a".to_string(), 1).unwrap();
///
/// assert_eq!(map.get("a"), None);
/// txn.commit().unwrap();
/// assert_eq!(map.get("a"), Some(1));
/// ```
pub struct Transaction<K, V> {
    id: TransactionId,
    map: Arc<MapInner<K, V>>,
    /// `None` once committed or aborted.
    context: Option<TransactionContext<K, V>>,
}

impl<K, V> Transaction<K, V> {
    pub(crate) fn new(id: TransactionId, map: Arc<MapInner<K, V>>) -> Self
    where
        K: Ord,
    {
        Self {
            id,
            map,
            context: Some(TransactionContext::new()),
        }
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns true until the transaction is committed or aborted.
    pub fn is_active(&self) -> bool {
        self.context.is_some()
    }

    fn context(&self) -> MapResult<&TransactionContext<K, V>> {
        self.context.as_ref().ok_or(MapError::NoActiveTransaction)
    }

    fn context_mut(&mut self) -> MapResult<&mut TransactionContext<K, V>> {
        self.context.as_mut().ok_or(MapError::NoActiveTransaction)
    }
}

impl<K: Ord + Clone, V: Clone> Transaction<K, V> {
    /// Returns the value visible to this transaction for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn get<Q>(&self, key: &Q) -> MapResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let context = self.context()?;
        self.map.stats.record_read();
        Ok(context.get(key, &self.map.store.read()).cloned())
    }

    /// Returns true if `key` is visible to this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn contains_key<Q>(&self, key: &Q) -> MapResult<bool>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let context = self.context()?;
        self.map.stats.record_read();
        Ok(context.contains_key(key, &self.map.store.read()))
    }

    /// Returns true if any entry visible to this transaction holds `value`.
    ///
    /// This scans every visible entry.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn contains_value(&self, value: &V) -> MapResult<bool>
    where
        V: PartialEq,
    {
        let context = self.context()?;
        self.map.stats.record_scan();
        Ok(context.contains_value(value, &self.map.store.read()))
    }

    /// Returns the number of entries visible to this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn len(&self) -> MapResult<usize> {
        let context = self.context()?;
        Ok(context.len(&self.map.store.read()))
    }

    /// Returns true if no entry is visible to this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn is_empty(&self) -> MapResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Stages `value` under `key` and returns the previous visible value.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn put(&mut self, key: K, value: V) -> MapResult<Option<V>> {
        let context = self.context.as_mut().ok_or(MapError::NoActiveTransaction)?;
        self.map.stats.record_write();
        Ok(context.put(key, value, &self.map.store.read()))
    }

    /// Stages every entry of `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn put_all<I>(&mut self, entries: I) -> MapResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let context = self.context.as_mut().ok_or(MapError::NoActiveTransaction)?;
        let base = self.map.store.read();
        for (key, value) in entries {
            self.map.stats.record_write();
            context.put(key, value, &base);
        }
        Ok(())
    }

    /// Stages the removal of `key` and returns the previous visible value.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn remove<Q>(&mut self, key: &Q) -> MapResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized + ToOwned<Owned = K>,
    {
        let context = self.context.as_mut().ok_or(MapError::NoActiveTransaction)?;
        self.map.stats.record_delete();
        Ok(context.remove(key, &self.map.store.read()))
    }

    /// Stages a clear: the committed entries become invisible to this
    /// transaction and are dropped on commit.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn clear(&mut self) -> MapResult<()> {
        self.context_mut()?.clear();
        self.map.stats.record_clear();
        Ok(())
    }

    /// Returns a read-only view of the entries visible to this transaction.
    ///
    /// The view holds a shared lock on the committed entries, which blocks
    /// other callers' idle writes and the merge of this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn entries(&self) -> MapResult<MergedView<'_, K, V>> {
        let context = self.context()?;
        self.map.stats.record_scan();
        Ok(MergedView::new(context, self.map.store.read()))
    }

    /// Returns a view that can stage removals while walking the entries.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn entries_mut(&mut self) -> MapResult<MergedViewMut<'_, K, V>> {
        let context = self.context.as_mut().ok_or(MapError::NoActiveTransaction)?;
        self.map.stats.record_scan();
        Ok(MergedViewMut::new(context, self.map.store.read()))
    }

    /// Applies the staged changes to the map and ends the transaction.
    ///
    /// No reader observes a partially applied transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn commit(&mut self) -> MapResult<MergeSummary> {
        let context = self.context.take().ok_or(MapError::NoActiveTransaction)?;
        let map = &self.map;
        let summary = map
            .registry
            .finish(self.id, || context.merge_into(&mut map.store.write()))?;

        map.stats.record_transaction_commit();
        debug!(
            map = %map.config.name,
            txn = %self.id,
            cleared = summary.cleared,
            removed = summary.removed,
            upserted = summary.upserted,
            "transaction committed"
        );
        Ok(summary)
    }

    /// Discards the staged changes and ends the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if the handle is finished.
    pub fn abort(&mut self) -> MapResult<()> {
        let context = self.context.take().ok_or(MapError::NoActiveTransaction)?;
        self.map.registry.finish(self.id, || drop(context))?;

        self.map.stats.record_transaction_abort();
        debug!(map = %self.map.config.name, txn = %self.id, "transaction aborted");
        Ok(())
    }
}

impl<K, V> Drop for Transaction<K, V> {
    fn drop(&mut self) {
        if self.context.take().is_none() {
            return;
        }
        if self.map.registry.finish(self.id, || ()).is_err() {
            trace!(txn = %self.id, "dropped handle no longer owned the map");
            return;
        }
        self.map.stats.record_transaction_abort();
        if self.map.config.warn_on_dropped_transaction {
            warn!(
                map = %self.map.config.name,
                txn = %self.id,
                "transaction dropped without commit or abort; changes discarded"
            );
        }
    }
}

impl<K, V> fmt::Debug for Transaction<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
