//! # txmap Core
//!
//! A sorted, in-memory key-value map with single-owner transactions.
//!
//! This crate provides:
//! - A committed base store shared by every caller
//! - At most one active transaction per map, owned through a [`Transaction`]
//!   handle
//! - Isolation: staged changes are invisible to other callers until commit
//! - Atomic commit: the staged changes are merged under an exclusive lock
//! - Fail-fast rejection of other callers' writes while a transaction is active
//! - Key/value/entry views and cursors over committed or staged state
//!
//! ## Example
//!
//! ```rust
//! use txmap_core::{MapError, TransactionalMap};
//! use std::thread;
//!
//! let map: TransactionalMap<String, u32> = TransactionalMap::new();
//! map.put("a".to_string(), 1).unwrap();
//!
//! let mut txn = map.begin_transaction().unwrap();
//! txn.put("b".to_string(), 2).unwrap();
//!
//! let reader = map.clone();
//! thread::spawn(move || {
//!     assert_eq!(reader.get("b"), None);
//!     assert!(matches!(
//!         reader.begin_transaction(),
//!         Err(MapError::TransactionConflict { .. })
//!     ));
//! })
//! .join()
//! .unwrap();
//!
//! txn.commit().unwrap();
//! assert_eq!(map.get("b"), Some(2));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod map;
mod stats;
mod store;
mod transaction;
mod types;
mod view;

pub use config::MapConfig;
pub use error::{MapError, MapResult};
pub use map::TransactionalMap;
pub use stats::{MapStats, StatsSnapshot};
pub use store::BaseStore;
pub use transaction::{Transaction, TransactionContext, TransactionRegistry};
pub use types::{MergeSummary, TransactionId};
pub use view::{
    BaseCursor, BaseView, LiveView, MergedCursor, MergedIter, MergedView, MergedViewMut,
    SnapshotView,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
