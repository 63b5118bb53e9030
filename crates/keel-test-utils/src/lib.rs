//! Test fixtures for Keel development.
//!
//! Provides [`DropProbe`], a shared drop counter for asserting that
//! refcounted values are destroyed exactly when expected, and
//! [`TestNode`], a minimal concrete [`HierarchyNode`] for tree tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use keel_core::{Ref, RefCount, RefCounted};
use keel_hierarchy::{Hierarchy, HierarchyError, HierarchyNode, NodeOps};

/// Shared drop counter. Hand out [`tokens`](DropProbe::token) to values
/// under test; each token increments the counter when dropped.
#[derive(Clone, Default)]
pub struct DropProbe {
    drops: Arc<AtomicU32>,
}

impl DropProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens dropped so far.
    pub fn drops(&self) -> u32 {
        self.drops.load(Ordering::SeqCst)
    }

    /// A token that reports its own drop to this probe.
    pub fn token(&self) -> DropToken {
        DropToken {
            drops: Arc::clone(&self.drops),
        }
    }
}

/// Increments its [`DropProbe`]'s counter exactly once, on drop.
pub struct DropToken {
    drops: Arc<AtomicU32>,
}

impl Drop for DropToken {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Minimal concrete hierarchy node: a label, an optional drop token,
/// and the embedded tree state.
pub struct TestNode {
    refs: RefCount,
    tree: Hierarchy<TestNode>,
    label: String,
    _token: Option<DropToken>,
}

impl TestNode {
    /// A detached node.
    pub fn new(label: impl Into<String>) -> Ref<TestNode> {
        Ref::new(TestNode {
            refs: RefCount::new(),
            tree: Hierarchy::new(),
            label: label.into(),
            _token: None,
        })
    }

    /// A detached node whose destruction is reported to `probe`.
    pub fn with_probe(label: impl Into<String>, probe: &DropProbe) -> Ref<TestNode> {
        Ref::new(TestNode {
            refs: RefCount::new(),
            tree: Hierarchy::new(),
            label: label.into(),
            _token: Some(probe.token()),
        })
    }

    /// A node created directly under `parent`.
    pub fn child_of(
        parent: &Ref<TestNode>,
        label: impl Into<String>,
    ) -> Result<Ref<TestNode>, HierarchyError> {
        let node = Self::new(label);
        parent.add_child(&node)?;
        Ok(node)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl RefCounted for TestNode {
    fn ref_count(&self) -> &RefCount {
        &self.refs
    }
}

impl HierarchyNode for TestNode {
    fn hierarchy(&self) -> &Hierarchy<Self> {
        &self.tree
    }
}

impl fmt::Debug for TestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestNode({})", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_counts_token_drops() {
        let probe = DropProbe::new();
        let a = probe.token();
        let b = probe.token();
        assert_eq!(probe.drops(), 0);
        drop(a);
        assert_eq!(probe.drops(), 1);
        drop(b);
        assert_eq!(probe.drops(), 2);
    }

    #[test]
    fn child_of_attaches() {
        let root = TestNode::new("root");
        let child = TestNode::child_of(&root, "child").unwrap();
        assert_eq!(child.parent().as_ref(), Some(&root));
        assert_eq!(root.child_count(), 1);
    }
}
