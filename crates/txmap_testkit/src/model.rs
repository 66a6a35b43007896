//! Reference model for transactional maps.
//!
//! [`ModelMap`] is a plain `BTreeMap` that applies the same [`Op`]s a test
//! applies through a [`Transaction`]. The model has no transactions: applying
//! a sequence to it yields the state a committed transaction must produce.

use std::collections::BTreeMap;
use txmap_core::{MapResult, Transaction, TransactionalMap};

/// Key type used by the model and generators.
pub type ModelKey = u8;
/// Value type used by the model and generators.
pub type ModelValue = u32;

/// A single map operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Insert or replace a value.
    Put {
        /// Key
        key: ModelKey,
        /// Value
        value: ModelValue,
    },
    /// Remove a key.
    Remove {
        /// Key
        key: ModelKey,
    },
    /// Read a key.
    Get {
        /// Key
        key: ModelKey,
    },
    /// Check a key.
    ContainsKey {
        /// Key
        key: ModelKey,
    },
    /// Check for a value anywhere in the map.
    ContainsValue {
        /// Value
        value: ModelValue,
    },
    /// Count the entries.
    Len,
    /// Remove everything.
    Clear,
}

/// What an [`Op`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A previous or current value.
    Value(Option<ModelValue>),
    /// A membership answer.
    Present(bool),
    /// An entry count.
    Len(usize),
    /// Nothing.
    Unit,
}

/// `BTreeMap` reference model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelMap {
    entries: BTreeMap<ModelKey, ModelValue>,
}

impl ModelMap {
    /// Creates a model holding `entries`.
    pub fn new(entries: BTreeMap<ModelKey, ModelValue>) -> Self {
        Self { entries }
    }

    /// Returns the model's entries.
    pub fn entries(&self) -> &BTreeMap<ModelKey, ModelValue> {
        &self.entries
    }

    /// Applies `op` and returns its outcome.
    pub fn apply(&mut self, op: &Op) -> Outcome {
        match *op {
            Op::Put { key, value } => Outcome::Value(self.entries.insert(key, value)),
            Op::Remove { key } => Outcome::Value(self.entries.remove(&key)),
            Op::Get { key } => Outcome::Value(self.entries.get(&key).copied()),
            Op::ContainsKey { key } => Outcome::Present(self.entries.contains_key(&key)),
            Op::ContainsValue { value } => {
                Outcome::Present(self.entries.values().any(|v| *v == value))
            }
            Op::Len => Outcome::Len(self.entries.len()),
            Op::Clear => {
                self.entries.clear();
                Outcome::Unit
            }
        }
    }

    /// Applies every op in order.
    pub fn apply_all(&mut self, ops: &[Op]) {
        for op in ops {
            self.apply(op);
        }
    }
}

/// Applies `op` through a transaction handle and returns its outcome.
///
/// # Errors
///
/// Propagates the handle's error, e.g. when it is already finished.
pub fn apply_to_transaction(
    txn: &mut Transaction<ModelKey, ModelValue>,
    op: &Op,
) -> MapResult<Outcome> {
    Ok(match *op {
        Op::Put { key, value } => Outcome::Value(txn.put(key, value)?),
        Op::Remove { key } => Outcome::Value(txn.remove(&key)?),
        Op::Get { key } => Outcome::Value(txn.get(&key)?),
        Op::ContainsKey { key } => Outcome::Present(txn.contains_key(&key)?),
        Op::ContainsValue { value } => Outcome::Present(txn.contains_value(&value)?),
        Op::Len => Outcome::Len(txn.len()?),
        Op::Clear => {
            txn.clear()?;
            Outcome::Unit
        }
    })
}

/// Applies `op` directly to the map, outside any transaction.
///
/// # Errors
///
/// Returns the map's error, e.g. `WriteRejected` while a transaction is
/// active.
pub fn apply_to_map(map: &TransactionalMap<ModelKey, ModelValue>, op: &Op) -> MapResult<Outcome> {
    Ok(match *op {
        Op::Put { key, value } => Outcome::Value(map.put(key, value)?),
        Op::Remove { key } => Outcome::Value(map.remove(&key)?),
        Op::Get { key } => Outcome::Value(map.get(&key)),
        Op::ContainsKey { key } => Outcome::Present(map.contains_key(&key)),
        Op::ContainsValue { value } => Outcome::Present(map.contains_value(&value)),
        Op::Len => Outcome::Len(map.len()),
        Op::Clear => {
            map.clear()?;
            Outcome::Unit
        }
    })
}

/// Runs `ops` through a transaction on `map` and against a model seeded with
/// the map's committed state, returning the first divergence.
///
/// The transaction is left open so the caller can commit or abort it.
///
/// # Errors
///
/// Returns a description of the first step whose outcome differs from the
/// model, or whose visible length disagrees with iteration.
pub fn check_against_model(
    txn: &mut Transaction<ModelKey, ModelValue>,
    model: &mut ModelMap,
    ops: &[Op],
) -> Result<(), String> {
    for (step, op) in ops.iter().enumerate() {
        let expected = model.apply(op);
        let actual = apply_to_transaction(txn, op).map_err(|e| format!("step {step}: {e}"))?;
        if actual != expected {
            return Err(format!(
                "step {step} ({op:?}): expected {expected:?}, got {actual:?}"
            ));
        }

        let view = txn.entries().map_err(|e| e.to_string())?;
        let iterated = view.iter().count();
        if view.len() != iterated {
            return Err(format!(
                "step {step} ({op:?}): len {} but iteration produced {iterated}",
                view.len()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_applies_ops() {
        let mut model = ModelMap::default();
        assert_eq!(model.apply(&Op::Put { key: 1, value: 10 }), Outcome::Value(None));
        assert_eq!(model.apply(&Op::Put { key: 1, value: 11 }), Outcome::Value(Some(10)));
        assert_eq!(model.apply(&Op::ContainsValue { value: 11 }), Outcome::Present(true));
        assert_eq!(model.apply(&Op::Len), Outcome::Len(1));
        assert_eq!(model.apply(&Op::Remove { key: 1 }), Outcome::Value(Some(11)));
        assert_eq!(model.apply(&Op::Get { key: 1 }), Outcome::Value(None));
    }

    #[test]
    fn transaction_matches_model_for_fixed_sequence() {
        let seed: BTreeMap<_, _> = [(1, 100), (2, 200)].into_iter().collect();
        let map = TransactionalMap::from_entries(seed.clone());
        let mut model = ModelMap::new(seed);

        let ops = vec![
            Op::Remove { key: 1 },
            Op::Put { key: 3, value: 300 },
            Op::Len,
            Op::Clear,
            Op::Get { key: 2 },
            Op::Put { key: 2, value: 201 },
            Op::ContainsKey { key: 3 },
        ];

        let mut txn = map.begin_transaction().unwrap();
        check_against_model(&mut txn, &mut model, &ops).unwrap();
        txn.commit().unwrap();

        assert_eq!(&map.snapshot(), model.entries());
    }

    #[test]
    fn direct_ops_rejected_during_transaction() {
        let map: TransactionalMap<ModelKey, ModelValue> = TransactionalMap::new();
        let _txn = map.begin_transaction().unwrap();

        assert!(apply_to_map(&map, &Op::Put { key: 1, value: 1 }).is_err());
        assert_eq!(apply_to_map(&map, &Op::Len).unwrap(), Outcome::Len(0));
    }
}
