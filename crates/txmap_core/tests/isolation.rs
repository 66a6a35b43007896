//! Cross-thread isolation and exclusivity tests.

use std::sync::mpsc;
use std::thread;
use txmap_core::{MapError, TransactionalMap};

fn string_map(entries: &[(&str, &str)]) -> TransactionalMap<String, String> {
    TransactionalMap::from_entries(
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    )
}

#[test]
fn staged_write_invisible_to_other_thread_until_commit() {
    let map = string_map(&[]);
    let mut txn = map.begin_transaction().unwrap();
    txn.put("k".into(), "v".into()).unwrap();

    let reader = map.clone();
    let before = thread::spawn(move || reader.get("k")).join().unwrap();
    assert_eq!(before, None);

    txn.commit().unwrap();

    let reader = map.clone();
    let after = thread::spawn(move || reader.get("k")).join().unwrap();
    assert_eq!(after, Some("v".to_string()));
}

#[test]
fn aborted_write_never_visible() {
    let map = string_map(&[]);
    let mut txn = map.begin_transaction().unwrap();
    txn.put("k".into(), "v".into()).unwrap();
    txn.abort().unwrap();

    assert!(!map.contains_key("k"));
    assert_eq!(map.get("k"), None);
}

#[test]
fn second_transaction_conflicts_from_any_thread() {
    let map = string_map(&[]);
    let txn = map.begin_transaction().unwrap();
    let active = txn.id();

    let other = map.clone();
    let result = thread::spawn(move || other.begin_transaction().map(|t| t.id()))
        .join()
        .unwrap();
    assert_eq!(result, Err(MapError::TransactionConflict { active }));

    assert_eq!(
        map.begin_transaction().map(|t| t.id()),
        Err(MapError::TransactionConflict { active })
    );
}

#[test]
fn foreign_writes_fail_fast() {
    let map = string_map(&[("a", "1")]);
    let txn = map.begin_transaction().unwrap();
    let owner = txn.id();

    let other = map.clone();
    let results = thread::spawn(move || {
        vec![
            other.put("b".into(), "2".into()).map(|_| ()),
            other.remove("a").map(|_| ()),
            other.clear(),
        ]
    })
    .join()
    .unwrap();

    for result in results {
        assert_eq!(result, Err(MapError::WriteRejected { owner }));
    }
    assert_eq!(map.get("a"), Some("1".to_string()));
}

#[test]
fn clear_then_insert_commits_exact_state() {
    let map = string_map(&[("a", "1"), ("b", "2")]);
    let mut txn = map.begin_transaction().unwrap();
    txn.clear().unwrap();
    txn.put("k2".into(), "v2".into()).unwrap();
    txn.commit().unwrap();

    let committed: Vec<_> = map.snapshot().into_iter().collect();
    assert_eq!(committed, vec![("k2".to_string(), "v2".to_string())]);
}

#[test]
fn remove_then_insert_keeps_size_consistent() {
    let map: TransactionalMap<String, u32> =
        TransactionalMap::from_entries([("a".to_string(), 1)]);
    let mut txn = map.begin_transaction().unwrap();
    txn.remove("a").unwrap();
    txn.put("b".into(), 2).unwrap();

    assert_eq!(txn.len().unwrap(), 1);
    assert!(!txn.contains_key("a").unwrap());
    assert!(txn.contains_key("b").unwrap());
    assert_eq!(txn.entries().unwrap().iter().count(), 1);

    txn.commit().unwrap();
    let committed: Vec<_> = map.snapshot().into_iter().collect();
    assert_eq!(committed, vec![("b".to_string(), 2)]);
}

#[test]
fn owner_on_worker_thread_reader_on_main() {
    let map = string_map(&[("a", "1")]);
    let (staged_tx, staged_rx) = mpsc::channel();
    let (go_tx, go_rx) = mpsc::channel::<()>();

    let owner_map = map.clone();
    let owner = thread::spawn(move || {
        let mut txn = owner_map.begin_transaction().unwrap();
        txn.put("b".into(), "2".into()).unwrap();
        txn.remove("a").unwrap();
        assert_eq!(txn.get("a").unwrap(), None);
        assert_eq!(txn.get("b").unwrap(), Some("2".to_string()));
        staged_tx.send(txn.id()).unwrap();

        go_rx.recv().unwrap();
        txn.commit().unwrap();
    });

    let id = staged_rx.recv().unwrap();
    assert_eq!(map.active_transaction(), Some(id));
    assert_eq!(map.get("a"), Some("1".to_string()));
    assert_eq!(map.get("b"), None);
    assert_eq!(map.len(), 1);

    go_tx.send(()).unwrap();
    owner.join().unwrap();

    let committed: Vec<_> = map.snapshot().into_iter().collect();
    assert_eq!(committed, vec![("b".to_string(), "2".to_string())]);
    assert_eq!(map.active_transaction(), None);
}

#[test]
fn handle_moves_across_threads() {
    let map = string_map(&[]);
    let mut txn = map.begin_transaction().unwrap();
    txn.put("x".into(), "1".into()).unwrap();

    let summary = thread::spawn(move || txn.commit()).join().unwrap().unwrap();
    assert_eq!(summary.upserted, 1);
    assert_eq!(map.get("x"), Some("1".to_string()));
}

#[test]
fn readers_never_see_partial_commit() {
    let keys: Vec<String> = (0..64).map(|i| format!("k{i:02}")).collect();
    let map: TransactionalMap<String, u32> =
        TransactionalMap::from_entries(keys.iter().map(|k| (k.clone(), 0)));

    thread::scope(|scope| {
        let reader = map.clone();
        scope.spawn(move || {
            for _ in 0..200 {
                let snapshot = reader.snapshot();
                let first = snapshot.values().next().copied();
                assert!(snapshot.values().all(|v| Some(*v) == first));
            }
        });

        for round in 1..=20 {
            let mut txn = map.begin_transaction().unwrap();
            for key in &keys {
                txn.put(key.clone(), round).unwrap();
            }
            txn.commit().unwrap();
        }
    });

    assert!(map.snapshot().values().all(|v| *v == 20));
}
