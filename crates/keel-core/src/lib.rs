//! Lifetime and locking primitives for the Keel foundation layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! two abstractions every other Keel crate builds on: explicit reference
//! counting ([`RefCount`], [`Ref`], [`WeakRef`]) and mutual exclusion
//! ([`Monitor`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod monitor;
pub mod refcount;

pub use monitor::{Monitor, MonitorGuard, MonitorId};
pub use refcount::{Ref, RefCount, RefCounted, WeakRef};
