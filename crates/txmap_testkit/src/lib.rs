//! # txmap Testkit
//!
//! Test utilities for txmap.
//!
//! This crate provides:
//! - Map fixtures with predictable contents
//! - Property-based test generators using proptest
//! - A plain `BTreeMap` reference model to check transactions against
//! - A two-thread interleaving harness for ownership scenarios
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use txmap_testkit::prelude::*;
//!
//! let map = seeded_map(3);
//! let mut txn = map.begin_transaction().unwrap();
//! txn.remove("key0000").unwrap();
//! assert_eq!(map.len(), 3);
//! txn.commit().unwrap();
//! assert_eq!(map.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod interleave;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::interleave::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use interleave::*;
pub use model::*;
pub use stress::*;
