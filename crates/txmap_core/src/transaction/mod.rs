//! Transactions over a map.
//!
//! A map has at most one active transaction at a time:
//! - **Single owner**: `begin_transaction` fails while another transaction
//!   is active, including when the current owner calls it again
//! - **Isolation**: the owner's changes are staged in a
//!   [`TransactionContext`] and invisible to everyone else until commit
//! - **Atomic commit**: the staged changes are merged under an exclusive
//!   lock, so readers see either none or all of them
//! - **Fail-fast writers**: other callers' writes are rejected while a
//!   transaction is active rather than queued

mod context;
mod handle;
mod registry;

pub use context::TransactionContext;
pub use handle::Transaction;
pub use registry::TransactionRegistry;
