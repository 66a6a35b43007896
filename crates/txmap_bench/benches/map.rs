//! Transactional map benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use txmap_bench::{populated_map, random_entries, random_keys, BenchMap};

/// Benchmark direct puts and gets with no transaction active.
fn bench_idle_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle");

    group.bench_function("put", |b| {
        let map = BenchMap::new();
        let entries = random_entries(1024, 10_000);
        let mut i = 0;
        b.iter(|| {
            let (key, value) = entries[i % entries.len()];
            i += 1;
            black_box(map.put(key, value).unwrap());
        });
    });

    group.bench_function("get", |b| {
        let map = populated_map(10_000);
        let keys = random_keys(1024, 10_000);
        let mut i = 0;
        b.iter(|| {
            let key = keys[i % keys.len()];
            i += 1;
            black_box(map.get(&key));
        });
    });

    group.finish();
}

/// Benchmark staging a batch in a transaction and committing it.
fn bench_staged_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("staged_commit");

    for batch_size in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let map = populated_map(10_000);
                let entries = random_entries(batch_size, 20_000);
                b.iter(|| {
                    let mut txn = map.begin_transaction().unwrap();
                    txn.put_all(entries.iter().copied()).unwrap();
                    black_box(txn.commit().unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark reading through a transaction that overlays part of the base.
fn bench_merged_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("merged_iteration");

    for overlay in [0usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(10_000));
        group.bench_with_input(BenchmarkId::from_parameter(overlay), overlay, |b, &overlay| {
            let map = populated_map(10_000);
            let mut txn = map.begin_transaction().unwrap();
            for (i, key) in random_keys(overlay, 20_000).into_iter().enumerate() {
                if i % 3 == 0 {
                    txn.remove(&key).unwrap();
                } else {
                    txn.put(key, 0).unwrap();
                }
            }

            b.iter(|| {
                let view = txn.entries().unwrap();
                black_box(view.iter().count());
            });

            txn.abort().unwrap();
        });
    }

    group.finish();
}

/// Benchmark transactional point reads against direct reads.
fn bench_owner_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("owner_get");

    group.bench_function("through_transaction", |b| {
        let map = populated_map(10_000);
        let mut txn = map.begin_transaction().unwrap();
        txn.put_all(random_entries(500, 10_000)).unwrap();
        let keys = random_keys(1024, 10_000);
        let mut i = 0;
        b.iter(|| {
            let key = keys[i % keys.len()];
            i += 1;
            black_box(txn.get(&key).unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_idle_ops,
    bench_staged_commit,
    bench_merged_iteration,
    bench_owner_reads
);
criterion_main!(benches);
