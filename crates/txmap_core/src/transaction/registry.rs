//! Transaction registry.

use crate::error::{MapError, MapResult};
use crate::types::TransactionId;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks which transaction, if any, currently owns a map.
///
/// The registry is a single mutex-guarded slot, so "is a transaction active"
/// and "who owns it" are always read together. The slot is held only for
/// the duration of a state transition (begin, commit, abort) or an idle
/// write, never across calls.
///
/// ## Lock order
///
/// Callers that also need the base store must take the slot first.
#[derive(Debug)]
pub struct TransactionRegistry {
    /// Next transaction ID.
    next_id: AtomicU64,
    /// Owner of the active transaction.
    slot: Mutex<Option<TransactionId>>,
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionRegistry {
    /// Creates an idle registry.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            slot: Mutex::new(None),
        }
    }

    /// Returns the owner of the active transaction.
    pub fn active(&self) -> Option<TransactionId> {
        *self.slot.lock()
    }

    /// Claims the slot for a fresh transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::TransactionConflict`] if a transaction is already
    /// active.
    pub fn begin(&self) -> MapResult<TransactionId> {
        let mut slot = self.slot.lock();
        if let Some(active) = *slot {
            return Err(MapError::conflict(active));
        }
        let id = TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        *slot = Some(id);
        Ok(id)
    }

    /// Releases the slot held by `id`, running `f` while the slot is still
    /// locked.
    ///
    /// The slot is marked idle before `f` runs, so a panic inside `f` still
    /// leaves the registry usable.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoActiveTransaction`] if `id` does not own the
    /// slot.
    pub fn finish<R>(&self, id: TransactionId, f: impl FnOnce() -> R) -> MapResult<R> {
        let mut slot = self.slot.lock();
        if *slot != Some(id) {
            return Err(MapError::NoActiveTransaction);
        }
        *slot = None;
        Ok(f())
    }

    /// Runs `f` with the slot locked, provided no transaction is active.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::WriteRejected`] naming the owner if a transaction
    /// is active. Never waits for that transaction to finish.
    pub fn exclusive<R>(&self, f: impl FnOnce() -> R) -> MapResult<R> {
        let slot = self.slot.lock();
        if let Some(owner) = *slot {
            return Err(MapError::write_rejected(owner));
        }
        Ok(f())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<TransactionId>> {
        self.slot.lock()
    }
}
