//! Generic containers for the Keel foundation layer.
//!
//! Two sequence containers with deliberately different synchronization
//! policies:
//!
//! - [`Array`]: contiguous, growable, **unsynchronized**. Mutation takes
//!   `&mut self`, so sharing across threads requires an explicit wrapper —
//!   [`SyncArray`] is that wrapper.
//! - [`List`]: doubly-linked, every operation guarded by the list's own
//!   [`Monitor`](keel_core::Monitor), shareable by reference.
//!
//! Growth of an [`Array`] is driven by a [`GrowthStrategy`] chosen at
//! construction. Allocation failure and out-of-range indices surface as
//! [`ArrayError`]/[`ListError`] rather than aborting.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod error;
pub mod list;
pub mod strategy;
pub mod sync_array;

pub use array::Array;
pub use error::{ArrayError, ListError};
pub use list::{Cursor, List, ListId};
pub use strategy::GrowthStrategy;
pub use sync_array::SyncArray;
