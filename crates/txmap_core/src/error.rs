//! Error types for txmap.

use crate::types::TransactionId;
use thiserror::Error;

/// Result type for map operations.
pub type MapResult<T> = Result<T, MapError>;

/// Errors that can occur in map operations.
///
/// Every error is reported synchronously at the point of violation; nothing
/// is retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A transaction was requested while another one is in progress.
    ///
    /// Transactions do not nest, so this is also returned when the owner of
    /// the active transaction asks for a second one.
    #[error("transaction conflict: {active} is already in progress")]
    TransactionConflict {
        /// The transaction currently holding the map.
        active: TransactionId,
    },

    /// Commit, abort or a staged operation on a handle that no longer owns
    /// a transaction.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// A write from a caller that does not own the active transaction.
    #[error("write rejected: {owner} is in progress")]
    WriteRejected {
        /// The transaction currently holding the map.
        owner: TransactionId,
    },

    /// A cursor was asked to remove an element it is not positioned on.
    #[error("invalid iterator state: {message}")]
    InvalidIteratorState {
        /// Description of the misuse.
        message: String,
    },
}

impl MapError {
    /// Creates a transaction conflict error.
    pub fn conflict(active: TransactionId) -> Self {
        Self::TransactionConflict { active }
    }

    /// Creates a write rejected error.
    pub fn write_rejected(owner: TransactionId) -> Self {
        Self::WriteRejected { owner }
    }

    /// Creates an invalid iterator state error.
    pub fn invalid_iterator_state(message: impl Into<String>) -> Self {
        Self::InvalidIteratorState {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_transaction() {
        let err = MapError::conflict(TransactionId::new(3));
        assert_eq!(
            err.to_string(),
            "transaction conflict: txn:3 is already in progress"
        );

        let err = MapError::write_rejected(TransactionId::new(9));
        assert_eq!(err.to_string(), "write rejected: txn:9 is in progress");
    }

    #[test]
    fn iterator_state_message() {
        let err = MapError::invalid_iterator_state("remove called before advance");
        assert!(matches!(err, MapError::InvalidIteratorState { .. }));
        assert!(err.to_string().contains("before advance"));
    }
}
