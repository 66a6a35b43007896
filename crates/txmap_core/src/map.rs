//! The transactional map facade.

use crate::config::MapConfig;
use crate::error::{MapError, MapResult};
use crate::stats::{MapStats, StatsSnapshot};
use crate::store::BaseStore;
use crate::transaction::{Transaction, TransactionRegistry};
use crate::types::TransactionId;
use crate::view::{BaseView, LiveView, SnapshotView};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// State shared by a map and every transaction handle it hands out.
pub(crate) struct MapInner<K, V> {
    pub(crate) config: MapConfig,
    pub(crate) store: BaseStore<K, V>,
    pub(crate) registry: TransactionRegistry,
    pub(crate) stats: MapStats,
}

/// A sorted key-value map with at most one active transaction.
///
/// Calls made directly on the map act on committed state. A caller that
/// wants isolated, all-or-nothing changes calls
/// [`begin_transaction`](Self::begin_transaction) and works through the
/// returned [`Transaction`] handle.
///
/// While a transaction is active:
/// - reads on the map see committed state only
/// - writes on the map fail with [`MapError::WriteRejected`]
/// - another `begin_transaction` fails with [`MapError::TransactionConflict`]
///
/// Cloning the map is cheap and yields another reference to the same state.
///
/// ## Example
///
/// ```rust
/// use txmap_core::{MapError, TransactionalMap};
///
/// let map: TransactionalMap<String, String> =
///     TransactionalMap::from_entries([("a".to_string(), "1".to_string())]);
///
/// let mut txn = map.begin_transaction().unwrap();
/// txn.put("b".to_string(), "2".to_string()).unwrap();
/// txn.remove("a").unwrap();
///
/// // Other callers still see the committed state and cannot write.
/// assert_eq!(map.get("a"), Some("1".to_string()));
/// assert!(matches!(
///     map.put("c".to_string(), "3".to_string()),
///     Err(MapError::WriteRejected { .. })
/// ));
///
/// txn.commit().unwrap();
/// assert_eq!(map.get("a"), None);
/// assert_eq!(map.get("b"), Some("2".to_string()));
/// ```
pub struct TransactionalMap<K, V> {
    inner: Arc<MapInner<K, V>>,
}

impl<K, V> Clone for TransactionalMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Ord, V> Default for TransactionalMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> TransactionalMap<K, V> {
    /// Creates an empty map with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Creates an empty map with the given configuration.
    #[must_use]
    pub fn with_config(config: MapConfig) -> Self {
        Self::with_entries(config, BTreeMap::new())
    }

    /// Creates a map holding `entries`, with the default configuration.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::with_entries(MapConfig::default(), entries.into_iter().collect())
    }

    /// Creates a map holding `entries`, with the given configuration.
    #[must_use]
    pub fn with_entries(config: MapConfig, entries: BTreeMap<K, V>) -> Self {
        let stats = MapStats::new(config.collect_stats);
        Self {
            inner: Arc::new(MapInner {
                config,
                store: BaseStore::with_entries(entries),
                registry: TransactionRegistry::new(),
                stats,
            }),
        }
    }

    /// Returns the map's configuration.
    pub fn config(&self) -> &MapConfig {
        &self.inner.config
    }

    /// Returns the ID of the active transaction, if any.
    pub fn active_transaction(&self) -> Option<TransactionId> {
        self.inner.registry.active()
    }

    /// Returns a snapshot of the operation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Starts a transaction and returns the owner's handle.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::TransactionConflict`] if a transaction is already
    /// active, whoever owns it. Transactions do not nest.
    pub fn begin_transaction(&self) -> MapResult<Transaction<K, V>> {
        match self.inner.registry.begin() {
            Ok(id) => {
                self.inner.stats.record_transaction_start();
                debug!(map = %self.inner.config.name, txn = %id, "transaction started");
                Ok(Transaction::new(id, Arc::clone(&self.inner)))
            }
            Err(err) => {
                self.inner.stats.record_conflict();
                warn!(map = %self.inner.config.name, error = %err, "begin_transaction rejected");
                Err(err)
            }
        }
    }

    /// Runs `f` inside a transaction, committing if it returns `Ok` and
    /// aborting if it returns `Err`.
    ///
    /// # Errors
    ///
    /// Returns the error from `begin_transaction`, from `f`, or from the
    /// commit.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use txmap_core::TransactionalMap;
    ///
    /// let map: TransactionalMap<u32, u32> = TransactionalMap::new();
    /// map.transaction(|txn| {
    ///     txn.put(1, 10)?;
    ///     txn.put(2, 20)?;
    ///     Ok(())
    /// })
    /// .unwrap();
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn transaction<F, T>(&self, f: F) -> MapResult<T>
    where
        K: Clone,
        V: Clone,
        F: FnOnce(&mut Transaction<K, V>) -> MapResult<T>,
    {
        let mut txn = self.begin_transaction()?;
        match f(&mut txn) {
            Ok(result) => {
                txn.commit()?;
                Ok(result)
            }
            Err(e) => {
                // Don't mask the original error
                let _ = txn.abort();
                Err(e)
            }
        }
    }

    /// Returns the committed value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: Clone,
    {
        self.inner.stats.record_read();
        self.inner.store.read().get(key).cloned()
    }

    /// Returns true if `key` is committed.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.stats.record_read();
        self.inner.store.read().contains_key(key)
    }

    /// Returns true if any committed entry holds `value`.
    ///
    /// This scans every entry.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.inner.stats.record_scan();
        self.inner.store.read().values().any(|candidate| candidate == value)
    }

    /// Returns the number of committed entries.
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    /// Returns true if no entry is committed.
    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Inserts `value` under `key` and returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] if a transaction is active.
    pub fn put(&self, key: K, value: V) -> MapResult<Option<V>> {
        let previous = self.write("put", |entries| entries.insert(key, value))?;
        self.inner.stats.record_write();
        Ok(previous)
    }

    /// Inserts every entry of `entries` in one exclusive section.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] if a transaction is active.
    pub fn put_all<I>(&self, entries: I) -> MapResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let stats = &self.inner.stats;
        self.write("put_all", |base| {
            for (key, value) in entries {
                stats.record_write();
                base.insert(key, value);
            }
        })
    }

    /// Removes `key` and returns its previous value.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] if a transaction is active.
    pub fn remove<Q>(&self, key: &Q) -> MapResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let previous = self.write("remove", |entries| entries.remove(key))?;
        self.inner.stats.record_delete();
        Ok(previous)
    }

    /// Removes every committed entry.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] if a transaction is active.
    pub fn clear(&self) -> MapResult<()> {
        self.write("clear", BTreeMap::clear)?;
        self.inner.stats.record_clear();
        Ok(())
    }

    /// Returns a view of the committed entries.
    ///
    /// With no transaction active the view is live: it writes through to
    /// the map and holds off writers and `begin_transaction` until dropped,
    /// while reads from any thread proceed. The caller must not write
    /// through the map while holding it. With a transaction active the view
    /// is a read-only [`SnapshotView`].
    pub fn entries(&self) -> BaseView<'_, K, V>
    where
        K: Clone,
        V: Clone,
    {
        let inner = &*self.inner;
        inner.stats.record_scan();

        let slot = inner.registry.lock();
        let active = *slot;
        match active {
            Some(owner) => {
                trace!(map = %inner.config.name, owner = %owner, "serving snapshot view");
                BaseView::Snapshot(SnapshotView::new(inner.store.snapshot(), owner))
            }
            None => BaseView::Live(LiveView::new(
                slot,
                inner.store.upgradable_read(),
                &inner.stats,
            )),
        }
    }

    /// Returns a copy of the committed entries.
    pub fn snapshot(&self) -> BTreeMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.inner.store.snapshot()
    }

    fn write<R>(&self, op: &'static str, f: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> MapResult<R> {
        let inner = &*self.inner;
        inner
            .registry
            .exclusive(|| f(&mut *inner.store.write()))
            .map_err(|err| {
                if let MapError::WriteRejected { owner } = &err {
                    inner.stats.record_rejected_write();
                    warn!(map = %inner.config.name, op, owner = %owner, "write rejected");
                }
                err
            })
    }
}

impl<K, V> fmt::Debug for TransactionalMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionalMap")
            .field("name", &self.inner.config.name)
            .field("active_transaction", &self.inner.registry.active())
            .finish_non_exhaustive()
    }
}
