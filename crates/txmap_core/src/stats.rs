//! Map statistics.
//!
//! Counters are relaxed atomics: they are cheap to bump from any thread and
//! can be read while operations are in progress, but a snapshot taken under
//! load is not a consistent cut across counters.
//!
//! # Usage
//!
//! ```rust
//! use txmap_core::TransactionalMap;
//!
//! let map: TransactionalMap<String, u32> = TransactionalMap::new();
//! map.put("a".to_string(), 1).unwrap();
//!
//! let stats = map.stats();
//! assert_eq!(stats.writes, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for a map.
#[derive(Debug)]
pub struct MapStats {
    enabled: bool,

    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    clears: AtomicU64,
    scans: AtomicU64,

    transactions_started: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_aborted: AtomicU64,

    /// Rejected `begin_transaction` calls.
    conflicts: AtomicU64,
    /// Rejected writes from callers that do not own the active transaction.
    rejected_writes: AtomicU64,
}

impl Default for MapStats {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MapStats {
    /// Creates a new stats instance. Disabled stats ignore every record call.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            clears: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            transactions_started: AtomicU64::new(0),
            transactions_committed: AtomicU64::new(0),
            transactions_aborted: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
            rejected_writes: AtomicU64::new(0),
        }
    }

    fn bump(&self, counter: &AtomicU64) {
        self.bump_by(counter, 1);
    }

    fn bump_by(&self, counter: &AtomicU64, amount: u64) {
        if self.enabled && amount > 0 {
            counter.fetch_add(amount, Ordering::Relaxed);
        }
    }

    // === Increment methods (internal use) ===

    pub(crate) fn record_read(&self) {
        self.bump(&self.reads);
    }

    pub(crate) fn record_write(&self) {
        self.bump(&self.writes);
    }

    pub(crate) fn record_delete(&self) {
        self.bump(&self.deletes);
    }

    pub(crate) fn record_deletes(&self, count: usize) {
        self.bump_by(&self.deletes, count as u64);
    }

    pub(crate) fn record_clear(&self) {
        self.bump(&self.clears);
    }

    pub(crate) fn record_scan(&self) {
        self.bump(&self.scans);
    }

    pub(crate) fn record_transaction_start(&self) {
        self.bump(&self.transactions_started);
    }

    pub(crate) fn record_transaction_commit(&self) {
        self.bump(&self.transactions_committed);
    }

    pub(crate) fn record_transaction_abort(&self) {
        self.bump(&self.transactions_aborted);
    }

    pub(crate) fn record_conflict(&self) {
        self.bump(&self.conflicts);
    }

    pub(crate) fn record_rejected_write(&self) {
        self.bump(&self.rejected_writes);
    }

    // === Getter methods (public API) ===

    /// Returns whether counters are being maintained.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the total number of point reads (`get`, `contains_key`).
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the total number of `put` operations.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the total number of `remove` operations.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the total number of `clear` operations.
    pub fn clears(&self) -> u64 {
        self.clears.load(Ordering::Relaxed)
    }

    /// Returns the total number of full scans (views, `contains_value`).
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Returns the total number of transactions started.
    pub fn transactions_started(&self) -> u64 {
        self.transactions_started.load(Ordering::Relaxed)
    }

    /// Returns the total number of transactions committed.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the total number of transactions aborted, including handles
    /// dropped while still active.
    pub fn transactions_aborted(&self) -> u64 {
        self.transactions_aborted.load(Ordering::Relaxed)
    }

    /// Returns the number of rejected `begin_transaction` calls.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Returns the number of writes rejected because another caller owned
    /// the map.
    pub fn rejected_writes(&self) -> u64 {
        self.rejected_writes.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            writes: self.writes(),
            deletes: self.deletes(),
            clears: self.clears(),
            scans: self.scans(),
            transactions_started: self.transactions_started(),
            transactions_committed: self.transactions_committed(),
            transactions_aborted: self.transactions_aborted(),
            conflicts: self.conflicts(),
            rejected_writes: self.rejected_writes(),
        }
    }
}

/// A point-in-time snapshot of map statistics.
///
/// Unlike `MapStats`, this is a plain struct that can be compared or passed
/// across threads without atomics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatsSnapshot {
    /// Total number of point reads.
    pub reads: u64,
    /// Total number of puts.
    pub writes: u64,
    /// Total number of removes.
    pub deletes: u64,
    /// Total number of clears.
    pub clears: u64,
    /// Total number of full scans.
    pub scans: u64,
    /// Total number of transactions started.
    pub transactions_started: u64,
    /// Total number of transactions committed.
    pub transactions_committed: u64,
    /// Total number of transactions aborted.
    pub transactions_aborted: u64,
    /// Total number of rejected `begin_transaction` calls.
    pub conflicts: u64,
    /// Total number of rejected non-owner writes.
    pub rejected_writes: u64,
}
