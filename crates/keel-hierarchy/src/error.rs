//! Hierarchy-specific error types.

use std::error::Error;
use std::fmt;

/// Errors from tree mutation on a [`Hierarchy`](crate::Hierarchy).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    /// Attempt to attach a node as its own child.
    SelfAttach,
    /// Attempt to attach an ancestor as a descendant, which would make
    /// the tree cyclic and recurse forever on traversal or teardown.
    CycleDetected,
    /// The named node is not a child of this node.
    NotAChild,
    /// The child list could not allocate a node.
    AllocationFailed,
}

impl fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfAttach => write!(f, "node cannot be attached to itself"),
            Self::CycleDetected => {
                write!(f, "attaching this node would create a cycle in the tree")
            }
            Self::NotAChild => write!(f, "node is not a child of this parent"),
            Self::AllocationFailed => write!(f, "child list allocation failed"),
        }
    }
}

impl Error for HierarchyError {}
