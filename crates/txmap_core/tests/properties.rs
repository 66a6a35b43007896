//! Property tests for the transaction overlay.

use proptest::prelude::*;
use std::collections::BTreeMap;
use txmap_core::TransactionalMap;

#[derive(Debug, Clone)]
enum Change {
    Put(u8, u16),
    Remove(u8),
    Clear,
}

fn change_strategy() -> impl Strategy<Value = Change> {
    prop_oneof![
        5 => (0..12u8, any::<u16>()).prop_map(|(k, v)| Change::Put(k, v)),
        4 => (0..12u8).prop_map(Change::Remove),
        1 => Just(Change::Clear),
    ]
}

fn apply(expected: &mut BTreeMap<u8, u16>, change: &Change) {
    match change {
        Change::Put(k, v) => {
            expected.insert(*k, *v);
        }
        Change::Remove(k) => {
            expected.remove(k);
        }
        Change::Clear => expected.clear(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn len_tracks_iteration(
        seed in prop::collection::btree_map(0..12u8, any::<u16>(), 0..12),
        changes in prop::collection::vec(change_strategy(), 0..30),
    ) {
        let map = TransactionalMap::from_entries(seed);
        let mut txn = map.begin_transaction().unwrap();

        for change in &changes {
            match change {
                Change::Put(k, v) => { txn.put(*k, *v).unwrap(); }
                Change::Remove(k) => { txn.remove(k).unwrap(); }
                Change::Clear => txn.clear().unwrap(),
            }
            let counted = txn.entries().unwrap().iter().count();
            prop_assert_eq!(txn.len().unwrap(), counted);
        }
    }

    #[test]
    fn commit_matches_plain_map(
        seed in prop::collection::btree_map(0..12u8, any::<u16>(), 0..12),
        changes in prop::collection::vec(change_strategy(), 0..30),
    ) {
        let map = TransactionalMap::from_entries(seed.clone());
        let mut expected = seed;
        let mut txn = map.begin_transaction().unwrap();

        for change in &changes {
            apply(&mut expected, change);
            match change {
                Change::Put(k, v) => { txn.put(*k, *v).unwrap(); }
                Change::Remove(k) => { txn.remove(k).unwrap(); }
                Change::Clear => txn.clear().unwrap(),
            }
        }
        txn.commit().unwrap();

        prop_assert_eq!(map.snapshot(), expected);
    }
}
