//! Core type definitions for txmap.

use std::fmt;

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing per map and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Counts produced by merging a transaction into the base store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MergeSummary {
    /// Whether the base was cleared before applying changes.
    pub cleared: bool,
    /// Number of tombstoned keys removed from the base.
    pub removed: usize,
    /// Number of staged entries written into the base.
    pub upserted: usize,
}

impl MergeSummary {
    /// Returns true if the merge left the base untouched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.cleared && self.removed == 0 && self.upserted == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_ordering() {
        let t1 = TransactionId::new(1);
        let t2 = TransactionId::new(2);
        assert!(t1 < t2);
    }

    #[test]
    fn transaction_id_display() {
        let t = TransactionId::new(42);
        assert_eq!(format!("{t}"), "txn:42");
    }

    #[test]
    fn default_merge_summary_is_noop() {
        assert!(MergeSummary::default().is_noop());
        let summary = MergeSummary {
            upserted: 1,
            ..MergeSummary::default()
        };
        assert!(!summary.is_noop());
    }
}
