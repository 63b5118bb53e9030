//! Keel: the object-lifetime and generic-container foundation layer.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Keel sub-crates. For most users, adding `keel` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use keel::prelude::*;
//!
//! // A refcounted tree node: embed a RefCount and a Hierarchy.
//! struct SceneNode {
//!     refs: RefCount,
//!     tree: Hierarchy<SceneNode>,
//!     name: &'static str,
//! }
//!
//! impl SceneNode {
//!     fn new(name: &'static str) -> Ref<SceneNode> {
//!         Ref::new(SceneNode {
//!             refs: RefCount::named(name),
//!             tree: Hierarchy::new(),
//!             name,
//!         })
//!     }
//! }
//!
//! impl RefCounted for SceneNode {
//!     fn ref_count(&self) -> &RefCount { &self.refs }
//! }
//!
//! impl HierarchyNode for SceneNode {
//!     fn hierarchy(&self) -> &Hierarchy<Self> { &self.tree }
//! }
//!
//! // Build a two-level tree; the child is owned by the root.
//! let root = SceneNode::new("root");
//! let camera = SceneNode::new("camera");
//! root.add_child(&camera).unwrap();
//! assert_eq!(root.child_count(), 1);
//! assert_eq!(Ref::references(&camera), 2);
//! assert_eq!(camera.name, "camera");
//!
//! // Containers: a growable array with sort + search...
//! let mut order = Array::new();
//! for z in [3, 1, 2] {
//!     order.push_back(z).unwrap();
//! }
//! order.sort();
//! assert_eq!(order.binary_search(&2), Some(1));
//!
//! // ...and a monitor-guarded list, shareable across threads.
//! let queue = List::new();
//! let first = queue.push_back("draw").unwrap();
//! queue.push_back("present").unwrap();
//! queue.erase(first).unwrap();
//! assert_eq!(queue.to_vec(), vec!["present"]);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`base`] | `keel-core` | `RefCount`, `Ref`/`WeakRef`, `Monitor` |
//! | [`collections`] | `keel-collections` | `Array`, `SyncArray`, `List`, growth strategies |
//! | [`hierarchy`] | `keel-hierarchy` | `Hierarchy`, `HierarchyNode`, tree operations |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Lifetime and locking primitives (`keel-core`).
///
/// The reference-counting protocol ([`base::RefCount`], [`base::Ref`],
/// [`base::WeakRef`]) and the mutual-exclusion primitive
/// ([`base::Monitor`]).
pub use keel_core as base;

/// Generic containers (`keel-collections`).
///
/// The unsynchronized growable [`collections::Array`], its shared
/// wrapper [`collections::SyncArray`], and the monitor-guarded
/// [`collections::List`].
pub use keel_collections as collections;

/// Parent/child ownership trees (`keel-hierarchy`).
///
/// Embed a [`hierarchy::Hierarchy`] and implement
/// [`hierarchy::HierarchyNode`]; the tree operations come from
/// [`hierarchy::NodeOps`].
pub use keel_hierarchy as hierarchy;

/// Common imports for typical Keel usage.
///
/// ```rust
/// use keel::prelude::*;
/// ```
pub mod prelude {
    pub use keel_collections::{
        Array, ArrayError, Cursor, GrowthStrategy, List, ListError, SyncArray,
    };
    pub use keel_core::{Monitor, MonitorGuard, MonitorId, Ref, RefCount, RefCounted, WeakRef};
    pub use keel_hierarchy::{Hierarchy, HierarchyError, HierarchyNode, NodeOps};
}
