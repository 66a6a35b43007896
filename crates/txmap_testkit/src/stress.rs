//! Stress tests for txmap.
//!
//! These tests verify behavior under heavy load and concurrent access:
//! commits stay atomic for concurrent readers, foreign writes are rejected
//! rather than blocked, and racing `begin_transaction` calls admit exactly
//! one owner at a time.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use txmap_core::{MapError, TransactionalMap};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations (wrong results, not expected rejections).
    pub failed_ops: usize,
    /// Operations refused by the map as designed (conflicts, rejected writes).
    pub rejected_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            rejected_ops: 0,
            duration,
            ops_per_second,
        }
    }

    /// Records how many operations were refused by design.
    #[must_use]
    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.rejected_ops = rejected;
        self
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Rejected: {}", self.rejected_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations (transactions for writers) to perform.
    pub operations: usize,
    /// Number of concurrent threads besides the writer.
    pub threads: usize,
    /// Number of distinct keys.
    pub key_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            key_count: 64,
        }
    }
}

/// Map type used by the stress tests.
pub type StressMap = TransactionalMap<u32, u64>;

/// Creates a map with `key_count` keys all set to 0.
pub fn stress_map(config: &StressConfig) -> StressMap {
    TransactionalMap::from_entries((0..config.key_count as u32).map(|k| (k, 0)))
}

/// One writer commits `operations` transactions that each set every key to
/// the round number, while reader threads check that every snapshot and
/// view holds a single round.
///
/// A reader observing two different values counts as a failure.
pub fn stress_atomic_commits(map: &StressMap, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    let keys: Vec<u32> = (0..config.key_count as u32).collect();

    let start = Instant::now();

    let readers: Vec<_> = (0..config.threads)
        .map(|t| {
            let map = map.clone();
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let stop = Arc::clone(&stop);

            thread::spawn(move || {
                let mut i = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let uniform = if (t + i) % 2 == 0 {
                        let snapshot = map.snapshot();
                        all_equal(snapshot.values())
                    } else {
                        let view = map.entries();
                        all_equal(view.values())
                    };
                    if uniform {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                    i += 1;
                }
            })
        })
        .collect();

    for round in 1..=config.operations as u64 {
        let committed = map.transaction(|txn| {
            for key in &keys {
                txn.put(*key, round)?;
            }
            Ok(())
        });
        // Readers holding a live view can't make begin fail, only wait.
        match committed {
            Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
            Err(_) => failed.fetch_add(1, Ordering::Relaxed),
        };
    }

    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

fn all_equal<'a>(mut values: impl Iterator<Item = &'a u64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// One thread repeatedly holds a transaction while the others hammer the map
/// with direct writes.
///
/// A direct write either succeeds (no transaction active) or fails with
/// `WriteRejected`; anything else is a failure. Rejections are reported in
/// [`StressTestResult::rejected_ops`].
pub fn stress_rejected_writes(map: &StressMap, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    let key_count = config.key_count as u32;

    let start = Instant::now();

    let writers: Vec<_> = (0..config.threads)
        .map(|t| {
            let map = map.clone();
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let rejected = Arc::clone(&rejected);
            let stop = Arc::clone(&stop);

            thread::spawn(move || {
                let mut i = 0u32;
                while !stop.load(Ordering::Relaxed) {
                    let key = (t as u32 + i) % key_count;
                    match map.put(key, u64::from(i)) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(MapError::WriteRejected { .. }) => {
                            rejected.fetch_add(1, Ordering::Relaxed)
                        }
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                    i = i.wrapping_add(1);
                }
            })
        })
        .collect();

    for round in 0..config.operations as u64 {
        match map.begin_transaction() {
            Ok(mut txn) => {
                let staged = txn.put(0, round).and_then(|_| txn.commit());
                match staged {
                    Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                    Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                };
            }
            Err(_) => {
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    stop.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
    .with_rejected(rejected.load(Ordering::Relaxed))
}

/// Threads race to run read-modify-write transactions on key 0.
///
/// Losers of a race get `TransactionConflict` and retry. Since transactions
/// are exclusive, the final value of key 0 must equal the number of commits;
/// a mismatch is reported as one failed op.
pub fn stress_begin_contention(map: &StressMap, config: &StressConfig) -> StressTestResult {
    let committed = Arc::new(AtomicUsize::new(0));
    let conflicts = Arc::new(AtomicUsize::new(0));
    let per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let workers: Vec<_> = (0..config.threads.max(1))
        .map(|_| {
            let map = map.clone();
            let committed = Arc::clone(&committed);
            let conflicts = Arc::clone(&conflicts);

            thread::spawn(move || {
                let mut done = 0;
                while done < per_thread {
                    let result = map.transaction(|txn| {
                        let current = txn.get(&0)?.unwrap_or(0);
                        txn.put(0, current + 1)?;
                        Ok(())
                    });
                    match result {
                        Ok(()) => {
                            committed.fetch_add(1, Ordering::Relaxed);
                            done += 1;
                        }
                        Err(MapError::TransactionConflict { .. }) => {
                            conflicts.fetch_add(1, Ordering::Relaxed);
                            thread::yield_now();
                        }
                        Err(_) => return,
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("Thread panicked");
    }

    let commits = committed.load(Ordering::Relaxed);
    let consistent = map.get(&0) == Some(commits as u64);
    let failed = usize::from(!consistent) + (per_thread * config.threads.max(1) - commits);

    StressTestResult::new(commits, failed, start.elapsed())
        .with_rejected(conflicts.load(Ordering::Relaxed))
}
