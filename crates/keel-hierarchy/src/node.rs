//! The [`Hierarchy`] state block, the [`HierarchyNode`] trait, and the
//! [`NodeOps`] tree operations.

use std::sync::OnceLock;

use smallvec::SmallVec;

use keel_collections::List;
use keel_core::{Monitor, Ref, RefCounted, WeakRef};

use crate::error::HierarchyError;

/// The process-wide attach lock.
///
/// Held across an attach's cycle check and link: the check walks the
/// ancestor chain, and a concurrent attach could otherwise extend that
/// chain after it was validated (two threads attaching `a` under `b`
/// and `b` under `a` would both pass the check and link a cycle).
/// Detaches only remove edges and cannot create a cycle, so they do
/// not take this lock.
fn attach_lock() -> &'static Monitor<()> {
    static ATTACH: OnceLock<Monitor<()>> = OnceLock::new();
    ATTACH.get_or_init(|| Monitor::new(()))
}

/// Per-node tree state: one non-owning parent back-reference and one
/// owning child list.
///
/// Embedded in concrete node types; the node exposes it through
/// [`HierarchyNode::hierarchy`]. The parent slot is monitor-guarded and
/// the child list carries its own monitor, so tree mutation is safe to
/// call from any thread. The per-node locks are never held together —
/// an attach updates the list and the back-reference in sequence, so an
/// observer on another thread can see one half of an attach but never a
/// torn link (the invariant "child in `children` implies `parent` set"
/// holds at every operation boundary). Attaches additionally serialize
/// their validate-and-link section through one process-wide lock, so a
/// cycle check cannot be invalidated by a concurrent attach.
pub struct Hierarchy<T: HierarchyNode> {
    parent: Monitor<WeakRef<T>>,
    children: List<Ref<T>>,
}

impl<T: HierarchyNode> Hierarchy<T> {
    /// Create detached state: no parent, no children.
    pub fn new() -> Self {
        Self {
            parent: Monitor::new(WeakRef::new()),
            children: List::new(),
        }
    }
}

impl<T: HierarchyNode> Default for Hierarchy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HierarchyNode> std::fmt::Debug for Hierarchy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hierarchy")
            .field("children", &self.children.len())
            .finish()
    }
}

/// A refcounted type that participates in a parent/child tree.
///
/// Implementors embed a [`Hierarchy`] created fresh per node. The
/// `Send + Sync` bound makes every tree shareable across threads, which
/// the per-node monitors rely on.
pub trait HierarchyNode: RefCounted + Send + Sync + Sized + 'static {
    /// The embedded tree state.
    fn hierarchy(&self) -> &Hierarchy<Self>;
}

/// Tree operations on a handle to a [`HierarchyNode`].
///
/// Provided for `Ref<T>`; taking the operations on the owning handle
/// (rather than `&T`) guarantees the node outlives every operation, so
/// a reparent cannot destroy the node mid-flight even when its only
/// other reference was held by the parent being left.
pub trait NodeOps<T: HierarchyNode> {
    /// Attach `child` under this node, reparenting it away from any
    /// current parent first (that is a supported move, not an error).
    /// Grabs one owning reference to `child` for the child list and
    /// points `child`'s back-reference at this node.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::SelfAttach`] if `child` is this node.
    /// - [`HierarchyError::CycleDetected`] if `child` is an ancestor of
    ///   this node.
    /// - [`HierarchyError::AllocationFailed`] if the child list cannot
    ///   grow.
    fn add_child(&self, child: &Ref<T>) -> Result<(), HierarchyError>;

    /// Detach `child` from this node: unlink it from the child list,
    /// clear its back-reference, release the owning reference.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::NotAChild`] if `child` is not currently
    /// attached here.
    fn remove_child(&self, child: &Ref<T>) -> Result<(), HierarchyError>;

    /// Detach every child.
    fn remove_all_children(&self);

    /// Detach this node from its parent. No-op on a root.
    fn detach(&self);

    /// Move this node under `parent`, or detach it when `None`.
    /// Detaches from the old parent first. The borrow on this handle
    /// keeps the node alive across the transition.
    ///
    /// # Errors
    ///
    /// Same as [`add_child`](NodeOps::add_child) when `parent` is `Some`.
    fn set_parent(&self, parent: Option<&Ref<T>>) -> Result<(), HierarchyError>;

    /// Owning handle to the parent, or `None` on a root (or when the
    /// parent has been destroyed).
    fn parent(&self) -> Option<Ref<T>>;

    /// Snapshot of the children, front-to-back. Small trees stay on the
    /// stack.
    fn children(&self) -> SmallVec<[Ref<T>; 4]>;

    /// Number of children.
    fn child_count(&self) -> u32;

    /// Whether this node appears on `node`'s parent chain.
    fn is_ancestor_of(&self, node: &Ref<T>) -> bool;
}

impl<T: HierarchyNode> NodeOps<T> for Ref<T> {
    fn add_child(&self, child: &Ref<T>) -> Result<(), HierarchyError> {
        if Ref::ptr_eq(self, child) {
            return Err(HierarchyError::SelfAttach);
        }

        // Serialized against every other attach: between the ancestor
        // walk below and the link, no edge may appear underneath us.
        let _attach = attach_lock().enter();

        if child.is_ancestor_of(self) {
            return Err(HierarchyError::CycleDetected);
        }

        child.detach();
        self.hierarchy()
            .children
            .push_back(Ref::grab(child))
            .map_err(|_| HierarchyError::AllocationFailed)?;
        *child.hierarchy().parent.enter() = Ref::downgrade(self);
        Ok(())
    }

    fn remove_child(&self, child: &Ref<T>) -> Result<(), HierarchyError> {
        // Membership check and unlink are one operation; a node that is
        // not actually our child keeps its back-reference untouched.
        if !self.hierarchy().children.remove(child) {
            return Err(HierarchyError::NotAChild);
        }
        *child.hierarchy().parent.enter() = WeakRef::new();
        Ok(())
    }

    fn remove_all_children(&self) {
        let children = &self.hierarchy().children;
        while let Some(at) = children.first() {
            match children.erase(at) {
                Ok((child, _)) => {
                    *child.hierarchy().parent.enter() = WeakRef::new();
                }
                // Another thread erased it between first() and erase();
                // re-fetch and keep draining.
                Err(_) => continue,
            }
        }
    }

    fn detach(&self) {
        if let Some(parent) = self.parent() {
            // NotAChild here means another thread detached us first.
            let _ = parent.remove_child(self);
        }
    }

    fn set_parent(&self, parent: Option<&Ref<T>>) -> Result<(), HierarchyError> {
        match parent {
            Some(parent) => parent.add_child(self),
            None => {
                self.detach();
                Ok(())
            }
        }
    }

    fn parent(&self) -> Option<Ref<T>> {
        self.hierarchy().parent.enter().upgrade()
    }

    fn children(&self) -> SmallVec<[Ref<T>; 4]> {
        let mut out = SmallVec::new();
        self.hierarchy().children.for_each(|child| out.push(child.clone()));
        out
    }

    fn child_count(&self) -> u32 {
        self.hierarchy().children.len()
    }

    fn is_ancestor_of(&self, node: &Ref<T>) -> bool {
        let mut walk = node.parent();
        while let Some(ancestor) = walk {
            if Ref::ptr_eq(self, &ancestor) {
                return true;
            }
            walk = ancestor.parent();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::RefCount;

    struct Node {
        refs: RefCount,
        tree: Hierarchy<Node>,
        label: &'static str,
    }

    impl Node {
        fn new(label: &'static str) -> Ref<Node> {
            Ref::new(Node {
                refs: RefCount::named(label),
                tree: Hierarchy::new(),
                label,
            })
        }
    }

    impl std::fmt::Debug for Node {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Node({})", self.label)
        }
    }

    impl RefCounted for Node {
        fn ref_count(&self) -> &RefCount {
            &self.refs
        }
    }

    impl HierarchyNode for Node {
        fn hierarchy(&self) -> &Hierarchy<Self> {
            &self.tree
        }
    }

    fn labels(children: &[Ref<Node>]) -> Vec<&'static str> {
        children.iter().map(|c| c.label).collect()
    }

    #[test]
    fn attach_links_both_directions() {
        let parent = Node::new("parent");
        let child = Node::new("child");

        parent.add_child(&child).unwrap();

        assert_eq!(child.parent().as_ref(), Some(&parent));
        assert_eq!(labels(&parent.children()), vec!["child"]);
        assert_eq!(parent.child_count(), 1);
        // The child list holds the one owning grab.
        assert_eq!(Ref::references(&child), 2);
    }

    #[test]
    fn self_attach_is_rejected() {
        let node = Node::new("node");
        assert_eq!(node.add_child(&node), Err(HierarchyError::SelfAttach));
    }

    #[test]
    fn ancestor_attach_is_rejected() {
        let root = Node::new("root");
        let mid = Node::new("mid");
        let leaf = Node::new("leaf");
        root.add_child(&mid).unwrap();
        mid.add_child(&leaf).unwrap();

        assert_eq!(leaf.add_child(&root), Err(HierarchyError::CycleDetected));
        assert_eq!(leaf.add_child(&mid), Err(HierarchyError::CycleDetected));
        // The failed attaches changed nothing.
        assert_eq!(root.parent(), None);
        assert_eq!(labels(&mid.children()), vec!["leaf"]);
    }

    #[test]
    fn reparenting_moves_the_child() {
        let old_parent = Node::new("old");
        let new_parent = Node::new("new");
        let child = Node::new("child");

        old_parent.add_child(&child).unwrap();
        new_parent.add_child(&child).unwrap();

        assert_eq!(old_parent.child_count(), 0);
        assert_eq!(labels(&new_parent.children()), vec!["child"]);
        assert_eq!(child.parent().as_ref(), Some(&new_parent));
        // Still exactly one owning grab beyond the local handle.
        assert_eq!(Ref::references(&child), 2);
    }

    #[test]
    fn remove_child_clears_both_directions() {
        let parent = Node::new("parent");
        let child = Node::new("child");
        parent.add_child(&child).unwrap();

        parent.remove_child(&child).unwrap();
        assert_eq!(child.parent(), None);
        assert_eq!(parent.child_count(), 0);
        assert_eq!(Ref::references(&child), 1);

        assert_eq!(
            parent.remove_child(&child),
            Err(HierarchyError::NotAChild)
        );
    }

    #[test]
    fn detach_is_noop_on_root() {
        let root = Node::new("root");
        root.detach();
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn set_parent_none_detaches() {
        let parent = Node::new("parent");
        let child = Node::new("child");
        parent.add_child(&child).unwrap();

        child.set_parent(None).unwrap();
        assert_eq!(child.parent(), None);
        assert_eq!(parent.child_count(), 0);
    }

    #[test]
    fn set_parent_moves_between_parents() {
        let a = Node::new("a");
        let b = Node::new("b");
        let child = Node::new("child");

        child.set_parent(Some(&a)).unwrap();
        assert_eq!(child.parent().as_ref(), Some(&a));

        child.set_parent(Some(&b)).unwrap();
        assert_eq!(child.parent().as_ref(), Some(&b));
        assert_eq!(a.child_count(), 0);
        assert_eq!(labels(&b.children()), vec!["child"]);
    }

    #[test]
    fn remove_all_children_detaches_everything() {
        let parent = Node::new("parent");
        let kids = [Node::new("a"), Node::new("b"), Node::new("c")];
        for kid in &kids {
            parent.add_child(kid).unwrap();
        }
        assert_eq!(parent.child_count(), 3);

        parent.remove_all_children();
        assert_eq!(parent.child_count(), 0);
        for kid in &kids {
            assert_eq!(kid.parent(), None);
            assert_eq!(Ref::references(kid), 1);
        }
    }

    #[test]
    fn children_appear_exactly_once() {
        let parent = Node::new("parent");
        let child = Node::new("child");
        parent.add_child(&child).unwrap();
        // Re-attaching to the same parent is a reparent onto itself:
        // detach then attach, still exactly one entry.
        parent.add_child(&child).unwrap();
        assert_eq!(labels(&parent.children()), vec!["child"]);
        assert_eq!(Ref::references(&child), 2);
    }

    #[test]
    fn parent_of_destroyed_parent_is_none() {
        let child = Node::new("child");
        {
            let parent = Node::new("parent");
            parent.add_child(&child).unwrap();
            // Keep the child alive past its parent.
            parent.remove_child(&child).unwrap();
            parent.add_child(&child).unwrap();
        }
        // Parent dropped; the weak back-reference no longer upgrades.
        assert_eq!(child.parent(), None);
    }

    #[test]
    fn racing_opposite_attaches_never_form_a_cycle() {
        use std::thread;

        for _ in 0..200 {
            let a = Node::new("a");
            let b = Node::new("b");

            let other = {
                let a = a.clone();
                let b = b.clone();
                thread::spawn(move || a.add_child(&b).is_ok())
            };
            let here = b.add_child(&a).is_ok();
            let there = other.join().unwrap();

            // Exactly one attach wins; the loser must see the cycle.
            assert!(here != there);
            let a_under_b = a.parent().is_some_and(|p| Ref::ptr_eq(&p, &b));
            let b_under_a = b.parent().is_some_and(|p| Ref::ptr_eq(&p, &a));
            assert!(a_under_b != b_under_a);
        }
    }

    proptest::proptest! {
        /// Apply a random reparenting script over a fixed set of nodes.
        /// Whatever order the moves land in, the result is a forest:
        /// no node is its own ancestor, and a node with a parent appears
        /// exactly once in that parent's child list.
        #[test]
        fn random_reparenting_keeps_a_forest(
            moves in proptest::collection::vec((0usize..8, 0usize..9), 0..40),
        ) {
            let nodes: Vec<_> = (0..8).map(|_| Node::new("n")).collect();
            for (child, parent) in moves {
                if parent < nodes.len() {
                    // CycleDetected/SelfAttach are legal outcomes here.
                    let _ = nodes[child].set_parent(Some(&nodes[parent]));
                } else {
                    nodes[child].set_parent(None).unwrap();
                }
            }
            for node in &nodes {
                proptest::prop_assert!(!node.is_ancestor_of(node));
                if let Some(parent) = node.parent() {
                    let copies = parent
                        .children()
                        .iter()
                        .filter(|c| Ref::ptr_eq(c, node))
                        .count();
                    proptest::prop_assert_eq!(copies, 1);
                }
            }
        }
    }

    #[test]
    fn is_ancestor_of_walks_the_chain() {
        let root = Node::new("root");
        let mid = Node::new("mid");
        let leaf = Node::new("leaf");
        root.add_child(&mid).unwrap();
        mid.add_child(&leaf).unwrap();

        assert!(root.is_ancestor_of(&leaf));
        assert!(mid.is_ancestor_of(&leaf));
        assert!(!leaf.is_ancestor_of(&root));
        assert!(!root.is_ancestor_of(&root));
    }
}
