//! Parent/child ownership trees for the Keel foundation layer.
//!
//! A hierarchical node owns its children (each attach grabs a reference,
//! each detach releases it) and holds a non-owning back-reference to its
//! parent. Dropping the last reference to a node tears down its whole
//! subtree, each node destroyed exactly once.
//!
//! Concrete node types (scene nodes, UI widgets, file trees) embed a
//! [`Hierarchy`] and implement [`HierarchyNode`]; the tree operations
//! are provided on `Ref<T>` by the [`NodeOps`] extension trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod node;

pub use error::HierarchyError;
pub use node::{Hierarchy, HierarchyNode, NodeOps};
