//! Two-thread interleaving harness.
//!
//! Ownership of a transaction follows the handle, so most interesting
//! scenarios involve two callers on two threads: one owns a transaction,
//! the other reads or tries to write. [`run_alternating`] runs two lanes of
//! steps on two real threads in strict alternation (first lane step 0,
//! second lane step 0, first lane step 1, ...), which makes those scenarios
//! deterministic.
//!
//! A step must not block waiting on the other lane (for example by calling
//! `begin_transaction` while the other lane holds a live view), since the
//! other lane only runs once the current step returns.
//!
//! ## Example
//!
//! ```rust
//! use txmap_core::{MapError, Transaction, TransactionalMap};
//! use txmap_testkit::{run_alternating, Lane};
//!
//! let map: TransactionalMap<String, u32> = TransactionalMap::new();
//!
//! let owner = Lane::new("owner", (map.clone(), None::<Transaction<String, u32>>))
//!     .step(|(map, txn)| {
//!         let mut handle = map.begin_transaction().map_err(|e| e.to_string())?;
//!         handle.put("k".to_string(), 1).map_err(|e| e.to_string())?;
//!         *txn = Some(handle);
//!         Ok(())
//!     })
//!     .step(|(_, txn)| {
//!         let mut handle = txn.take().ok_or("no transaction")?;
//!         handle.commit().map_err(|e| e.to_string())?;
//!         Ok(())
//!     });
//!
//! let other = Lane::new("other", map.clone())
//!     .step(|map| match map.put("k".to_string(), 2) {
//!         Err(MapError::WriteRejected { .. }) => Ok(()),
//!         other => Err(format!("expected rejection, got {other:?}")),
//!     });
//!
//! run_alternating(owner, other).unwrap();
//! assert_eq!(map.get("k"), Some(1));
//! ```

use parking_lot::{Condvar, Mutex};
use std::thread;

/// One step of a lane. Returning `Err` stops the lane.
pub type Step<S> = Box<dyn FnOnce(&mut S) -> Result<(), String> + Send>;

/// A named sequence of steps run on one thread against lane-local state.
pub struct Lane<S> {
    name: String,
    state: S,
    steps: Vec<Step<S>>,
}

impl<S: Send> Lane<S> {
    /// Creates a lane with no steps.
    pub fn new(name: impl Into<String>, state: S) -> Self {
        Self {
            name: name.into(),
            state,
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn step<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut S) -> Result<(), String> + Send + 'static,
    {
        self.steps.push(Box::new(f));
        self
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the lane has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug)]
struct Turn {
    next: usize,
    done: [bool; 2],
}

struct Baton {
    turn: Mutex<Turn>,
    changed: Condvar,
}

impl Baton {
    fn wait_for(&self, me: usize) {
        let other = 1 - me;
        let mut turn = self.turn.lock();
        while turn.next != me && !turn.done[other] {
            self.changed.wait(&mut turn);
        }
    }

    fn pass(&self, me: usize) {
        let mut turn = self.turn.lock();
        turn.next = 1 - me;
        self.changed.notify_all();
    }
}

/// Marks a lane finished even if one of its steps panics, so the other lane
/// never waits on it forever.
struct Finished<'a> {
    baton: &'a Baton,
    me: usize,
}

impl Drop for Finished<'_> {
    fn drop(&mut self) {
        let mut turn = self.baton.turn.lock();
        turn.done[self.me] = true;
        turn.next = 1 - self.me;
        self.baton.changed.notify_all();
    }
}

fn run_lane<S>(baton: &Baton, me: usize, lane: Lane<S>) -> (S, Result<(), String>) {
    let _finished = Finished { baton, me };
    let Lane {
        name,
        mut state,
        steps,
    } = lane;

    for (index, step) in steps.into_iter().enumerate() {
        baton.wait_for(me);
        let result = step(&mut state);
        baton.pass(me);
        if let Err(message) = result {
            return (state, Err(format!("lane `{name}` step {index}: {message}")));
        }
    }
    (state, Ok(()))
}

/// Runs `first` and `second` on two threads in strict alternation, starting
/// with `first`, and returns both lanes' final states.
///
/// When one lane runs out of steps (or fails) the other runs its remaining
/// steps back to back.
///
/// # Errors
///
/// Returns the first failing step's message, naming its lane and index.
///
/// # Panics
///
/// Re-raises a panic from any step.
pub fn run_alternating<A, B>(first: Lane<A>, second: Lane<B>) -> Result<(A, B), String>
where
    A: Send,
    B: Send,
{
    let baton = Baton {
        turn: Mutex::new(Turn {
            next: 0,
            done: [false; 2],
        }),
        changed: Condvar::new(),
    };

    let ((a, first_result), (b, second_result)) = thread::scope(|scope| {
        let baton = &baton;
        let first = scope.spawn(move || run_lane(baton, 0, first));
        let second = scope.spawn(move || run_lane(baton, 1, second));
        let joined_first = first.join();
        let joined_second = second.join();
        match (joined_first, joined_second) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(panic), _) | (_, Err(panic)) => std::panic::resume_unwind(panic),
        }
    });

    first_result?;
    second_result?;
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn steps_alternate() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut first = Lane::new("first", Arc::clone(&log));
        let mut second = Lane::new("second", Arc::clone(&log));
        for i in 0..3 {
            first = first.step(move |log| {
                log.lock().push(format!("a{i}"));
                Ok(())
            });
            second = second.step(move |log| {
                log.lock().push(format!("b{i}"));
                Ok(())
            });
        }
        assert_eq!(first.len(), 3);

        run_alternating(first, second).unwrap();
        assert_eq!(*log.lock(), vec!["a0", "b0", "a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn uneven_lanes_finish() {
        let first = Lane::new("first", 0u32)
            .step(|n| {
                *n += 1;
                Ok(())
            })
            .step(|n| {
                *n += 1;
                Ok(())
            })
            .step(|n| {
                *n += 1;
                Ok(())
            });
        let second = Lane::new("second", ());

        let (count, ()) = run_alternating(first, second).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn failing_step_is_reported() {
        let first = Lane::new("first", ()).step(|_| Ok(()));
        let second = Lane::new("second", ()).step(|_| Err("boom".to_string()));

        let err = run_alternating(first, second).unwrap_err();
        assert_eq!(err, "lane `second` step 0: boom");
    }

    #[test]
    #[should_panic(expected = "step exploded")]
    fn panicking_step_propagates() {
        let first = Lane::new("first", ()).step(|_| panic!("step exploded"));
        let second = Lane::new("second", ()).step(|_| Ok(())).step(|_| Ok(()));

        let _ = run_alternating(first, second);
    }
}
