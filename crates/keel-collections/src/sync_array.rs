//! Monitor-guarded wrapper making a shared mutable [`Array`] explicit.

use keel_core::{Monitor, MonitorGuard, MonitorId};

use crate::array::Array;
use crate::strategy::GrowthStrategy;

/// An [`Array`] behind its own [`Monitor`].
///
/// A bare [`Array`] performs no locking by design; this wrapper is the
/// explicit opt-in for sharing one across threads. [`lock`](SyncArray::lock)
/// yields a guard dereferencing to the array, so a compound mutation
/// (check, then insert) runs under a single monitor entry — unlike a
/// per-call lock, which would leave a window between the calls.
///
/// # Examples
///
/// ```
/// use keel_collections::SyncArray;
///
/// let shared: SyncArray<u32> = SyncArray::new();
/// {
///     let mut array = shared.lock();
///     array.push_back(7).unwrap();
///     array.push_back(3).unwrap();
///     array.sort();
/// }
/// assert_eq!(shared.lock().as_slice(), &[3, 7]);
/// ```
pub struct SyncArray<T> {
    monitor: Monitor<Array<T>>,
}

impl<T> SyncArray<T> {
    /// Create an empty shared array with the default growth strategy.
    pub fn new() -> Self {
        Self::from(Array::new())
    }

    /// Create an empty shared array with the given growth strategy.
    pub fn with_strategy(strategy: GrowthStrategy) -> Self {
        Self::from(Array::with_strategy(strategy))
    }

    /// Enter the monitor and access the array until the guard drops.
    pub fn lock(&self) -> MonitorGuard<'_, Array<T>> {
        self.monitor.enter()
    }

    /// The id of the wrapping monitor.
    pub fn monitor_id(&self) -> MonitorId {
        self.monitor.id()
    }

    /// Consume the wrapper, returning the array.
    pub fn into_inner(self) -> Array<T> {
        self.monitor.into_inner()
    }
}

impl<T> From<Array<T>> for SyncArray<T> {
    fn from(array: Array<T>) -> Self {
        Self {
            monitor: Monitor::new(array),
        }
    }
}

impl<T> Default for SyncArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Compile-time assertion: SyncArray must be shareable across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SyncArray<u32>>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_mutation_under_one_entry() {
        let shared = SyncArray::new();
        {
            let mut array = shared.lock();
            if array.is_empty() {
                array.push_back(1).unwrap();
            }
            array.push_back(2).unwrap();
        }
        assert_eq!(shared.lock().as_slice(), &[1, 2]);
    }

    #[test]
    fn into_inner_returns_the_array() {
        let shared = SyncArray::new();
        shared.lock().push_back(5u8).unwrap();
        let array = shared.into_inner();
        assert_eq!(array.as_slice(), &[5]);
    }

    #[test]
    fn strategy_passes_through() {
        let shared: SyncArray<u8> = SyncArray::with_strategy(GrowthStrategy::Safe);
        assert_eq!(shared.lock().strategy(), GrowthStrategy::Safe);
    }
}
