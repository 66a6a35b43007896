//! Property-based test generators using proptest.
//!
//! Keys are drawn from a small space so that generated sequences revisit
//! keys often: removing a staged key, re-inserting a removed one, and
//! writing after a clear are the interesting cases.

use crate::model::{ModelKey, ModelValue, Op};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Number of distinct keys generated.
pub const KEY_SPACE: ModelKey = 16;

/// Strategy for generating keys.
pub fn key_strategy() -> impl Strategy<Value = ModelKey> {
    0..KEY_SPACE
}

/// Strategy for generating values.
pub fn value_strategy() -> impl Strategy<Value = ModelValue> {
    0..1000u32
}

/// Strategy for generating committed starting states.
pub fn seed_strategy() -> impl Strategy<Value = BTreeMap<ModelKey, ModelValue>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..(KEY_SPACE as usize))
}

/// Strategy for generating a single operation.
pub fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (key_strategy(), value_strategy()).prop_map(|(key, value)| Op::Put { key, value }),
        3 => key_strategy().prop_map(|key| Op::Remove { key }),
        2 => key_strategy().prop_map(|key| Op::Get { key }),
        1 => key_strategy().prop_map(|key| Op::ContainsKey { key }),
        1 => value_strategy().prop_map(|value| Op::ContainsValue { value }),
        1 => Just(Op::Len),
        1 => Just(Op::Clear),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn op_sequence_strategy(min_ops: usize, max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 64,
            max_shrink_iters: 200,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{check_against_model, ModelMap};
    use txmap_core::TransactionalMap;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn committed_sequence_matches_model(
            seed in seed_strategy(),
            ops in op_sequence_strategy(1, 40),
        ) {
            let map = TransactionalMap::from_entries(seed.clone());
            let mut model = ModelMap::new(seed);

            let mut txn = map.begin_transaction().unwrap();
            let checked = check_against_model(&mut txn, &mut model, &ops);
            prop_assert!(checked.is_ok(), "{}", checked.unwrap_err());
            txn.commit().unwrap();

            prop_assert_eq!(&map.snapshot(), model.entries());
            prop_assert_eq!(map.len(), model.entries().len());
        }

        #[test]
        fn aborted_sequence_leaves_base_untouched(
            seed in seed_strategy(),
            ops in op_sequence_strategy(1, 40),
        ) {
            let map = TransactionalMap::from_entries(seed.clone());
            let mut model = ModelMap::new(seed.clone());

            let mut txn = map.begin_transaction().unwrap();
            let checked = check_against_model(&mut txn, &mut model, &ops);
            prop_assert!(checked.is_ok(), "{}", checked.unwrap_err());
            txn.abort().unwrap();

            prop_assert_eq!(map.snapshot(), seed);
        }

        #[test]
        fn committed_state_hidden_until_commit(
            seed in seed_strategy(),
            ops in op_sequence_strategy(1, 20),
        ) {
            let map = TransactionalMap::from_entries(seed.clone());
            let mut model = ModelMap::new(seed.clone());

            let mut txn = map.begin_transaction().unwrap();
            check_against_model(&mut txn, &mut model, &ops).unwrap();

            prop_assert_eq!(map.snapshot(), seed);
            txn.commit().unwrap();
            prop_assert_eq!(&map.snapshot(), model.entries());
        }

        #[test]
        fn generated_keys_stay_in_space(key in key_strategy()) {
            prop_assert!(key < KEY_SPACE);
        }
    }
}
