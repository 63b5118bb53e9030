//! Explicit reference counting: [`RefCount`], the [`RefCounted`] trait,
//! and the [`Ref`]/[`WeakRef`] handle pair.
//!
//! A refcounted object embeds a [`RefCount`] and starts life with a count
//! of 1, held by its creator. Every additional holder grabs the counter;
//! every holder releases it when done; the release that observes the
//! transition to zero is the one that destroys the object, exactly once.
//!
//! [`Ref<T>`] packages that protocol into an owning handle whose `Clone`
//! grabs and whose `Drop` releases, so the count can never be mismatched
//! through the handle API. Counter traffic is atomic: concurrent grab and
//! release on the same object from multiple threads is race-free.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

/// Embeddable atomic reference counter.
///
/// Created at 1: the creator holds the first reference implicitly.
/// The count is only ever mutated through [`grab`](RefCount::grab) and
/// [`release`](RefCount::release).
///
/// Releasing more times than granted is a caller bug and panics rather
/// than silently underflowing — an over-release is the root cause of a
/// use-after-destroy and must stop execution at the point of detection.
#[derive(Debug)]
pub struct RefCount {
    count: AtomicU32,
    /// Optional name reported in over-release panics, for leak triage.
    debug_name: Option<&'static str>,
}

impl RefCount {
    /// Create a counter at 1 (the creator's implicit reference).
    pub fn new() -> Self {
        Self {
            count: AtomicU32::new(1),
            debug_name: None,
        }
    }

    /// Create a counter at 1 with a diagnostic name.
    ///
    /// The name appears in the over-release panic message.
    pub fn named(debug_name: &'static str) -> Self {
        Self {
            count: AtomicU32::new(1),
            debug_name: Some(debug_name),
        }
    }

    /// Increment the count by one.
    ///
    /// Extends the object's lifetime by one more required
    /// [`release`](RefCount::release).
    pub fn grab(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement the count by one. Returns `true` exactly when this call
    /// brought the count to zero — the caller that sees `true` is the one
    /// responsible for destroying the object.
    ///
    /// # Panics
    ///
    /// Panics if the count is already zero. A fetch-sub would wrap the
    /// counter and resurrect the object for every other observer, so the
    /// decrement is a compare-exchange loop that can refuse.
    pub fn release(&self) -> bool {
        let mut current = self.count.load(Ordering::Relaxed);
        loop {
            assert!(
                current > 0,
                "release() on '{}' with count already at zero",
                self.debug_name.unwrap_or("<unnamed>"),
            );
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current == 1,
                Err(observed) => current = observed,
            }
        }
    }

    /// Current count. Informational only: a concurrent grab or release
    /// can change it immediately after this load, so it must never be
    /// used for lifetime decisions.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// The diagnostic name, if one was set at construction.
    pub fn debug_name(&self) -> Option<&'static str> {
        self.debug_name
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.debug_name {
            Some(name) => write!(f, "RefCount('{}', {})", name, self.count()),
            None => write!(f, "RefCount({})", self.count()),
        }
    }
}

// Compile-time assertion: RefCount must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RefCount>();
};

/// Implemented by types whose lifetime is governed by an embedded
/// [`RefCount`].
///
/// The counter must be created fresh (at 1) when the value is constructed
/// and must not be shared between values.
pub trait RefCounted {
    /// The embedded lifetime counter.
    fn ref_count(&self) -> &RefCount;
}

/// Owning handle to a refcounted object.
///
/// Each live `Ref` accounts for exactly one unit of the embedded
/// [`RefCount`]: [`Ref::new`] assumes the creator's implicit reference,
/// `Clone` grabs, `Drop` releases. The value is destroyed exactly once,
/// by the drop whose release observes zero.
///
/// Equality (`PartialEq`) is identity, not value, equality: two handles
/// are equal iff they point at the same object.
pub struct Ref<T: RefCounted> {
    target: Arc<T>,
}

impl<T: RefCounted> Ref<T> {
    /// Take ownership of a freshly constructed value, assuming the
    /// implicit first reference its [`RefCount`] was created with.
    pub fn new(value: T) -> Self {
        Self {
            target: Arc::new(value),
        }
    }

    /// Grab another reference. Equivalent to `Clone`, spelled as an
    /// associated function so call sites that care about the counter
    /// can say so explicitly.
    pub fn grab(this: &Self) -> Self {
        this.target.ref_count().grab();
        Self {
            target: Arc::clone(&this.target),
        }
    }

    /// Number of live references. Informational only; see
    /// [`RefCount::count`].
    pub fn references(this: &Self) -> u32 {
        this.target.ref_count().count()
    }

    /// Whether two handles point at the same object.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.target, &b.target)
    }

    /// Create a non-owning [`WeakRef`] to the same object.
    pub fn downgrade(this: &Self) -> WeakRef<T> {
        WeakRef {
            target: Arc::downgrade(&this.target),
        }
    }
}

impl<T: RefCounted> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Ref::grab(self)
    }
}

impl<T: RefCounted> Drop for Ref<T> {
    fn drop(&mut self) {
        // When this release observes zero, this handle also holds the
        // last `Arc`, so the value is destroyed right after.
        self.target.ref_count().release();
    }
}

impl<T: RefCounted> Deref for Ref<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.target
    }
}

impl<T: RefCounted> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        Ref::ptr_eq(self, other)
    }
}

impl<T: RefCounted> Eq for Ref<T> {}

impl<T: RefCounted + fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&*self.target).finish()
    }
}

/// Non-owning back-reference to a refcounted object.
///
/// Does not keep the target alive. [`upgrade`](WeakRef::upgrade) yields
/// an owning [`Ref`] (grabbing the counter) only while at least one other
/// `Ref` is still live.
pub struct WeakRef<T: RefCounted> {
    target: Weak<T>,
}

impl<T: RefCounted> WeakRef<T> {
    /// Create an empty back-reference that never upgrades.
    pub fn new() -> Self {
        Self {
            target: Weak::new(),
        }
    }

    /// Attempt to obtain an owning handle. Returns `None` if the target
    /// has been destroyed (or this `WeakRef` was created empty).
    pub fn upgrade(&self) -> Option<Ref<T>> {
        let target = self.target.upgrade()?;
        target.ref_count().grab();
        Some(Ref { target })
    }
}

impl<T: RefCounted> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        Self {
            target: Weak::clone(&self.target),
        }
    }
}

impl<T: RefCounted> Default for WeakRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RefCounted> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakRef")
    }
}
