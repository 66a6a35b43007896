//! Key/value/entry views over the map.
//!
//! Views are recomputed on every access and never copy the map, with one
//! exception: a caller that does not own the active transaction receives a
//! [`SnapshotView`], a detached copy of the committed entries, so that it
//! cannot race the owner's merge.
//!
//! - [`MergedView`] / [`MergedViewMut`]: the owner's view, overlaying the
//!   staged changes on the base store.
//! - [`BaseView`]: everyone else's view, either [`LiveView`] (no transaction
//!   active) or [`SnapshotView`] (a transaction is active).
//!
//! Cursors ([`MergedCursor`], [`BaseCursor`]) walk a mutable view one entry
//! at a time and can remove the entry they are positioned on.

mod base;
mod merged;

pub use base::{BaseCursor, BaseView, LiveView, SnapshotView};
pub use merged::{MergedCursor, MergedIter, MergedView, MergedViewMut};

use std::collections::btree_map::Range;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Entries strictly after `after`, or all entries if `after` is `None`.
///
/// Cursors resume from the last key they yielded, which stays valid even
/// when that key has since been removed.
pub(crate) fn range_after<'a, K: Ord, V>(
    map: &'a BTreeMap<K, V>,
    after: Option<&K>,
) -> Range<'a, K, V> {
    match after {
        Some(key) => map.range((Bound::Excluded(key), Bound::Unbounded)),
        None => map.range::<K, _>(..),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_after_skips_through_key() {
        let map: BTreeMap<u32, u32> = (1..=4).map(|i| (i, i * 10)).collect();

        let all: Vec<_> = range_after(&map, None).map(|(k, _)| *k).collect();
        assert_eq!(all, vec![1, 2, 3, 4]);

        let rest: Vec<_> = range_after(&map, Some(&2)).map(|(k, _)| *k).collect();
        assert_eq!(rest, vec![3, 4]);
    }

    #[test]
    fn range_after_missing_key() {
        let map: BTreeMap<u32, u32> = [(1, 1), (5, 5)].into_iter().collect();
        let rest: Vec<_> = range_after(&map, Some(&3)).map(|(k, _)| *k).collect();
        assert_eq!(rest, vec![5]);
    }
}
