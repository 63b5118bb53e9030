//! Mutual exclusion: the [`Monitor`] primitive and its RAII guard.
//!
//! A monitor owns the state it guards. [`Monitor::enter`] blocks until
//! the lock is free and returns a [`MonitorGuard`] that releases on drop,
//! so enter/exit can never be mismatched. The lock is non-reentrant;
//! re-entering from the owning thread panics instead of deadlocking.
//!
//! Every monitor carries a process-unique [`MonitorId`]. When two
//! monitors must be held at once (for example to exchange the contents
//! of two containers), [`Monitor::enter_both`] acquires them in ascending
//! id order — a fixed global order that rules out lock-order inversion
//! between threads taking the same pair in opposite directions.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counter for unique [`MonitorId`] allocation.
static MONITOR_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Counter for unique per-thread token allocation. Token 0 is reserved
/// as the "no owner" sentinel.
static THREAD_TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity token for a thread, used for reentrancy
/// detection. Never 0.
fn thread_token() -> u64 {
    thread_local! {
        static TOKEN: u64 = THREAD_TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed);
    }
    TOKEN.with(|token| *token)
}

/// Unique per-instance identifier for a [`Monitor`].
///
/// Allocated from a monotonic atomic counter via [`MonitorId::next`].
/// Two distinct monitors always have different ids, which gives a stable
/// total order for multi-lock acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorId(u64);

impl MonitorId {
    /// Allocate a fresh, unique monitor id. Thread-safe.
    pub fn next() -> Self {
        Self(MONITOR_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-reentrant mutual-exclusion lock owning the state it guards.
///
/// Container types embed one monitor per instance and funnel every
/// state access through [`enter`](Monitor::enter). Two calls on the
/// same container are each internally consistent but not atomic as a
/// pair: a check-then-act sequence by the caller can still observe
/// staleness between the two calls.
pub struct Monitor<T> {
    id: MonitorId,
    /// Token of the thread currently inside the monitor; 0 when free.
    /// Written only by the holder, so a thread reading its own token
    /// back is a certain self-reentry.
    owner: AtomicU64,
    state: Mutex<T>,
}

impl<T> Monitor<T> {
    /// Create a monitor guarding `state`.
    pub fn new(state: T) -> Self {
        Self {
            id: MonitorId::next(),
            owner: AtomicU64::new(0),
            state: Mutex::new(state),
        }
    }

    /// This monitor's unique id.
    pub fn id(&self) -> MonitorId {
        self.id
    }

    /// Block until the lock is free, then enter it.
    ///
    /// A panic while the guard is held does not wedge the monitor:
    /// poison is absorbed, since the guarded invariants are maintained
    /// by the container operations themselves, each of which completes
    /// or panics before touching shared links.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds this monitor — the
    /// alternative is a silent self-deadlock.
    pub fn enter(&self) -> MonitorGuard<'_, T> {
        let me = thread_token();
        assert!(
            self.owner.load(Ordering::Acquire) != me,
            "monitor {} re-entered from its owning thread",
            self.id,
        );
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.owner.store(me, Ordering::Release);
        MonitorGuard {
            owner: &self.owner,
            guard,
        }
    }

    /// Enter two monitors in ascending [`MonitorId`] order, returning
    /// the guards in argument order.
    ///
    /// # Panics
    ///
    /// Panics if both arguments are the same monitor.
    pub fn enter_both<'a>(
        a: &'a Monitor<T>,
        b: &'a Monitor<T>,
    ) -> (MonitorGuard<'a, T>, MonitorGuard<'a, T>) {
        assert!(a.id != b.id, "enter_both called with one monitor twice");
        if a.id < b.id {
            let guard_a = a.enter();
            let guard_b = b.enter();
            (guard_a, guard_b)
        } else {
            let guard_b = b.enter();
            let guard_a = a.enter();
            (guard_a, guard_b)
        }
    }

    /// Mutable access without locking. Requires exclusive ownership of
    /// the monitor itself, so no other thread can hold the lock.
    pub fn get_mut(&mut self) -> &mut T {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Consume the monitor, returning the guarded state.
    pub fn into_inner(self) -> T {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Monitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor").field("id", &self.id).finish()
    }
}

// Compile-time assertion: Monitor must be Send + Sync for shareable state.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Monitor<u32>>();
};

/// RAII guard for a [`Monitor`]. Dereferences to the guarded state and
/// exits the monitor on drop.
pub struct MonitorGuard<'a, T> {
    owner: &'a AtomicU64,
    guard: MutexGuard<'a, T>,
}

impl<T> Drop for MonitorGuard<'_, T> {
    fn drop(&mut self) {
        // Clear ownership before the inner lock is released (the field
        // drops after this body runs).
        self.owner.store(0, Ordering::Release);
    }
}

impl<T> Deref for MonitorGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for MonitorGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn guards_state_and_releases_on_drop() {
        let monitor = Monitor::new(0u32);
        {
            let mut guard = monitor.enter();
            *guard += 1;
        }
        assert_eq!(*monitor.enter(), 1);
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let a = Monitor::new(());
        let b = Monitor::new(());
        assert_ne!(a.id(), b.id());
        assert!(a.id() < b.id());
    }

    #[test]
    #[should_panic(expected = "re-entered from its owning thread")]
    fn reentry_panics_instead_of_deadlocking() {
        let monitor = Monitor::new(());
        let _held = monitor.enter();
        let _reentry = monitor.enter();
    }

    #[test]
    fn excludes_other_threads() {
        let monitor = Arc::new(Monitor::new(0u64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let monitor = Arc::clone(&monitor);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let mut guard = monitor.enter();
                        // Non-atomic read-modify-write; only the monitor
                        // keeps this from losing updates.
                        let value = *guard;
                        *guard = value + 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*monitor.enter(), 8000);
    }

    #[test]
    fn enter_both_returns_guards_in_argument_order() {
        let a = Monitor::new('a');
        let b = Monitor::new('b');
        let (guard_a, guard_b) = Monitor::enter_both(&a, &b);
        assert_eq!(*guard_a, 'a');
        assert_eq!(*guard_b, 'b');
        drop((guard_a, guard_b));

        // Reversed argument order still works and still maps correctly.
        let (guard_b, guard_a) = Monitor::enter_both(&b, &a);
        assert_eq!(*guard_a, 'a');
        assert_eq!(*guard_b, 'b');
    }

    #[test]
    fn enter_both_is_deadlock_free_under_contention() {
        let a = Arc::new(Monitor::new(0u32));
        let b = Arc::new(Monitor::new(0u32));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let a = Arc::clone(&a);
                let b = Arc::clone(&b);
                thread::spawn(move || {
                    for _ in 0..500 {
                        // Half the threads pass the pair reversed.
                        let (mut first, mut second) = if i % 2 == 0 {
                            Monitor::enter_both(&a, &b)
                        } else {
                            Monitor::enter_both(&b, &a)
                        };
                        *first += 1;
                        *second += 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // 4 threads x 500 rounds, one increment per monitor per round.
        assert_eq!(*a.enter() + *b.enter(), 4000);
    }

    #[test]
    fn survives_panic_while_held() {
        let monitor = Arc::new(Monitor::new(41u32));
        let clone = Arc::clone(&monitor);
        let result = thread::spawn(move || {
            let _guard = clone.enter();
            panic!("poisoned on purpose");
        })
        .join();
        assert!(result.is_err());

        // Poison is absorbed; the monitor keeps working.
        let mut guard = monitor.enter();
        *guard += 1;
        assert_eq!(*guard, 42);
    }

    #[test]
    fn get_mut_and_into_inner() {
        let mut monitor = Monitor::new(vec![1, 2]);
        monitor.get_mut().push(3);
        assert_eq!(monitor.into_inner(), vec![1, 2, 3]);
    }
}
