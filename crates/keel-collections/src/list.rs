//! Monitor-guarded doubly-linked list with generation-checked cursors.
//!
//! Nodes live in a slab (a `Vec` of slots threaded with an intrusive
//! free list) guarded by one [`Monitor`] per list. Every operation —
//! mutating or size-observing — enters the monitor, so single calls are
//! safe from any thread. Compound sequences ("check empty, then pop")
//! are **not** atomic across calls; callers needing that must build it
//! from a single operation or hold their own lock.
//!
//! A [`Cursor`] is a copyable handle carrying the list's identity, a
//! slot index, and the slot's generation at mint time. Erasing a node
//! bumps its slot generation, so exactly the cursors to the erased node
//! go stale and every other cursor stays valid.

use std::fmt;

use keel_core::{Monitor, MonitorGuard};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ListError;

/// Counter for unique [`ListId`] allocation.
static LIST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a list's node storage.
///
/// Minted into every [`Cursor`] so a cursor presented to the wrong list
/// is rejected instead of resolving to an unrelated node that happens
/// to share a slot index. After [`List::swap`], the storage (and its id)
/// moves wholesale, so cursors follow their nodes to the other list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(u64);

impl ListId {
    /// Allocate a fresh, unique list id. Thread-safe.
    pub fn next() -> Self {
        Self(LIST_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Copyable handle to one list node.
///
/// Generation-scoped: erasing the node invalidates the cursor in O(1)
/// without any lookup table, the same staleness check a generational
/// handle gives an arena allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    list: ListId,
    index: u32,
    generation: u32,
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cursor(list={}, slot={}, gen={})",
            self.list, self.index, self.generation
        )
    }
}

/// One linked node: non-owning prev/next slot links plus the element.
struct NodeCell<T> {
    prev: Option<u32>,
    next: Option<u32>,
    element: T,
}

enum SlotState<T> {
    Occupied(NodeCell<T>),
    Vacant {
        /// Next slot on the intrusive free list.
        next_free: Option<u32>,
    },
}

/// A slab slot. The generation advances each time the slot is vacated,
/// which is what retires outstanding cursors to the old occupant.
struct Slot<T> {
    generation: u32,
    state: SlotState<T>,
}

/// The monitor-guarded state of a [`List`].
struct ListCore<T> {
    id: ListId,
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    first: Option<u32>,
    last: Option<u32>,
    len: u32,
}

impl<T> ListCore<T> {
    fn new() -> Self {
        Self {
            id: ListId::next(),
            slots: Vec::new(),
            free_head: None,
            first: None,
            last: None,
            len: 0,
        }
    }

    fn cursor_for(&self, index: u32) -> Cursor {
        Cursor {
            list: self.id,
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Check a cursor against this storage, yielding the slot index of a
    /// live node.
    fn resolve(&self, cursor: Cursor) -> Result<u32, ListError> {
        if cursor.list != self.id {
            return Err(ListError::ForeignCursor {
                cursor_list: cursor.list,
                list: self.id,
            });
        }
        let stale = ListError::StaleCursor {
            index: cursor.index,
            generation: cursor.generation,
        };
        let slot = self.slots.get(cursor.index as usize).ok_or(stale)?;
        if slot.generation != cursor.generation {
            return Err(stale);
        }
        match &slot.state {
            SlotState::Occupied(_) => Ok(cursor.index),
            SlotState::Vacant { .. } => Err(stale),
        }
    }

    fn cell(&self, index: u32) -> &NodeCell<T> {
        match &self.slots[index as usize].state {
            SlotState::Occupied(cell) => cell,
            SlotState::Vacant { .. } => panic!("vacant slot {index} in list chain"),
        }
    }

    fn cell_mut(&mut self, index: u32) -> &mut NodeCell<T> {
        match &mut self.slots[index as usize].state {
            SlotState::Occupied(cell) => cell,
            SlotState::Vacant { .. } => panic!("vacant slot {index} in list chain"),
        }
    }

    /// Place a cell into a vacant slot, reusing the free list before
    /// growing the slab.
    fn alloc(&mut self, cell: NodeCell<T>) -> Result<u32, ListError> {
        match self.free_head {
            Some(index) => {
                let next_free = match &self.slots[index as usize].state {
                    SlotState::Vacant { next_free } => *next_free,
                    SlotState::Occupied(_) => panic!("occupied slot {index} on free list"),
                };
                self.free_head = next_free;
                self.slots[index as usize].state = SlotState::Occupied(cell);
                Ok(index)
            }
            None => {
                if self.slots.len() >= u32::MAX as usize {
                    return Err(ListError::AllocationFailed);
                }
                self.slots
                    .try_reserve(1)
                    .map_err(|_| ListError::AllocationFailed)?;
                self.slots.push(Slot {
                    generation: 0,
                    state: SlotState::Occupied(cell),
                });
                Ok(self.slots.len() as u32 - 1)
            }
        }
    }

    fn push_back(&mut self, element: T) -> Result<u32, ListError> {
        let index = self.alloc(NodeCell {
            prev: self.last,
            next: None,
            element,
        })?;
        match self.last {
            Some(old_last) => self.cell_mut(old_last).next = Some(index),
            None => self.first = Some(index),
        }
        self.last = Some(index);
        self.len += 1;
        Ok(index)
    }

    fn push_front(&mut self, element: T) -> Result<u32, ListError> {
        let index = self.alloc(NodeCell {
            prev: None,
            next: self.first,
            element,
        })?;
        match self.first {
            Some(old_first) => self.cell_mut(old_first).prev = Some(index),
            None => self.last = Some(index),
        }
        self.first = Some(index);
        self.len += 1;
        Ok(index)
    }

    fn insert_before(&mut self, at: u32, element: T) -> Result<u32, ListError> {
        let prev = self.cell(at).prev;
        let index = self.alloc(NodeCell {
            prev,
            next: Some(at),
            element,
        })?;
        self.cell_mut(at).prev = Some(index);
        match prev {
            Some(prev) => self.cell_mut(prev).next = Some(index),
            None => self.first = Some(index),
        }
        self.len += 1;
        Ok(index)
    }

    fn insert_after(&mut self, at: u32, element: T) -> Result<u32, ListError> {
        let next = self.cell(at).next;
        let index = self.alloc(NodeCell {
            prev: Some(at),
            next,
            element,
        })?;
        self.cell_mut(at).next = Some(index);
        match next {
            Some(next) => self.cell_mut(next).prev = Some(index),
            None => self.last = Some(index),
        }
        self.len += 1;
        Ok(index)
    }

    /// Unlink and vacate the node at `index`, returning its element and
    /// the slot index of its successor.
    fn erase_at(&mut self, index: u32) -> (T, Option<u32>) {
        let slot = &mut self.slots[index as usize];
        let vacant = SlotState::Vacant {
            next_free: self.free_head,
        };
        let cell = match std::mem::replace(&mut slot.state, vacant) {
            SlotState::Occupied(cell) => cell,
            SlotState::Vacant { .. } => panic!("erase of vacant slot {index}"),
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_head = Some(index);

        match cell.prev {
            Some(prev) => self.cell_mut(prev).next = cell.next,
            None => self.first = cell.next,
        }
        match cell.next {
            Some(next) => self.cell_mut(next).prev = cell.prev,
            None => self.last = cell.prev,
        }
        self.len -= 1;
        (cell.element, cell.next)
    }

    /// Slot index of the node at position `index`, walking from `first`.
    fn slot_at_position(&self, index: u32) -> Result<u32, ListError> {
        if index >= self.len {
            return Err(ListError::OutOfRange {
                index,
                len: self.len,
            });
        }
        let mut slot = self.first.expect("non-empty list has a first node");
        for _ in 0..index {
            slot = self.cell(slot).next.expect("position within len has a node");
        }
        Ok(slot)
    }
}

/// A doubly-linked sequence guarded by its own [`Monitor`].
///
/// Insertion and erasure at a known [`Cursor`] are O(1); positional
/// access ([`nth`](List::nth)) is O(n) — there is no random access on a
/// linked structure.
///
/// # Examples
///
/// ```
/// use keel_collections::List;
///
/// let list = List::new();
/// let a = list.push_back('a').unwrap();
/// list.push_back('b').unwrap();
///
/// let (erased, _next) = list.erase(a).unwrap();
/// assert_eq!(erased, 'a');
/// assert_eq!(list.to_vec(), vec!['b']);
/// assert_eq!(list.len(), 1);
/// ```
pub struct List<T> {
    monitor: Monitor<ListCore<T>>,
}

impl<T> List<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            monitor: Monitor::new(ListCore::new()),
        }
    }

    /// This list's storage identity. Cursors minted by the list carry it.
    pub fn id(&self) -> ListId {
        self.monitor.enter().id
    }

    /// Number of nodes.
    pub fn len(&self) -> u32 {
        self.monitor.enter().len
    }

    /// Whether the list holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.monitor.enter().len == 0
    }

    /// Cursor to the first node, or `None` when empty.
    pub fn first(&self) -> Option<Cursor> {
        let core = self.monitor.enter();
        core.first.map(|index| core.cursor_for(index))
    }

    /// Cursor to the last node, or `None` when empty.
    pub fn last(&self) -> Option<Cursor> {
        let core = self.monitor.enter();
        core.last.map(|index| core.cursor_for(index))
    }

    /// Append an element; returns a cursor to the new node. O(1).
    ///
    /// # Errors
    ///
    /// Returns [`ListError::AllocationFailed`] if the slab cannot grow.
    pub fn push_back(&self, element: T) -> Result<Cursor, ListError> {
        let mut core = self.monitor.enter();
        let index = core.push_back(element)?;
        Ok(core.cursor_for(index))
    }

    /// Prepend an element; returns a cursor to the new node. O(1).
    ///
    /// # Errors
    ///
    /// Returns [`ListError::AllocationFailed`] if the slab cannot grow.
    pub fn push_front(&self, element: T) -> Result<Cursor, ListError> {
        let mut core = self.monitor.enter();
        let index = core.push_front(element)?;
        Ok(core.cursor_for(index))
    }

    /// Insert immediately before the node at `at`. O(1).
    ///
    /// # Errors
    ///
    /// Returns [`ListError::StaleCursor`]/[`ListError::ForeignCursor`]
    /// for an invalid cursor, [`ListError::AllocationFailed`] on growth
    /// failure.
    pub fn insert_before(&self, at: Cursor, element: T) -> Result<Cursor, ListError> {
        let mut core = self.monitor.enter();
        let at = core.resolve(at)?;
        let index = core.insert_before(at, element)?;
        Ok(core.cursor_for(index))
    }

    /// Insert immediately after the node at `at`. O(1).
    ///
    /// # Errors
    ///
    /// Same as [`insert_before`](List::insert_before).
    pub fn insert_after(&self, at: Cursor, element: T) -> Result<Cursor, ListError> {
        let mut core = self.monitor.enter();
        let at = core.resolve(at)?;
        let index = core.insert_after(at, element)?;
        Ok(core.cursor_for(index))
    }

    /// Unlink the node at `at`. O(1). Returns the element and a cursor
    /// to the successor (if any). Invalidates only cursors to the
    /// erased node.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::StaleCursor`]/[`ListError::ForeignCursor`]
    /// for an invalid cursor.
    pub fn erase(&self, at: Cursor) -> Result<(T, Option<Cursor>), ListError> {
        let mut core = self.monitor.enter();
        let at = core.resolve(at)?;
        let (element, next) = core.erase_at(at);
        let next = next.map(|index| core.cursor_for(index));
        Ok((element, next))
    }

    /// Unlink the first node equal to `element`. O(n). Returns whether
    /// a node was removed.
    pub fn remove(&self, element: &T) -> bool
    where
        T: PartialEq,
    {
        let mut core = self.monitor.enter();
        let mut walk = core.first;
        while let Some(index) = walk {
            if core.cell(index).element == *element {
                core.erase_at(index);
                return true;
            }
            walk = core.cell(index).next;
        }
        false
    }

    /// Remove every node. O(n).
    pub fn clear(&self) {
        let mut core = self.monitor.enter();
        while let Some(index) = core.first {
            core.erase_at(index);
        }
    }

    /// Cursor to the successor of the node at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::StaleCursor`]/[`ListError::ForeignCursor`]
    /// for an invalid cursor.
    pub fn next(&self, at: Cursor) -> Result<Option<Cursor>, ListError> {
        let core = self.monitor.enter();
        let at = core.resolve(at)?;
        Ok(core.cell(at).next.map(|index| core.cursor_for(index)))
    }

    /// Cursor to the predecessor of the node at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::StaleCursor`]/[`ListError::ForeignCursor`]
    /// for an invalid cursor.
    pub fn prev(&self, at: Cursor) -> Result<Option<Cursor>, ListError> {
        let core = self.monitor.enter();
        let at = core.resolve(at)?;
        Ok(core.cell(at).prev.map(|index| core.cursor_for(index)))
    }

    /// Clone out the element at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::StaleCursor`]/[`ListError::ForeignCursor`]
    /// for an invalid cursor.
    pub fn get(&self, at: Cursor) -> Result<T, ListError>
    where
        T: Clone,
    {
        let core = self.monitor.enter();
        let at = core.resolve(at)?;
        Ok(core.cell(at).element.clone())
    }

    /// Clone out the first element, or `None` when empty.
    pub fn front(&self) -> Option<T>
    where
        T: Clone,
    {
        let core = self.monitor.enter();
        core.first.map(|index| core.cell(index).element.clone())
    }

    /// Clone out the last element, or `None` when empty.
    pub fn back(&self) -> Option<T>
    where
        T: Clone,
    {
        let core = self.monitor.enter();
        core.last.map(|index| core.cell(index).element.clone())
    }

    /// Clone out the element at position `index`, walking from the
    /// front. **O(n)** — a linked list has no random access; callers
    /// that index in a loop are walking the list quadratically.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::OutOfRange`] if `index >= len()`.
    pub fn nth(&self, index: u32) -> Result<T, ListError>
    where
        T: Clone,
    {
        let core = self.monitor.enter();
        let slot = core.slot_at_position(index)?;
        Ok(core.cell(slot).element.clone())
    }

    /// Run `f` on every element front-to-back, under one monitor entry.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        let core = self.monitor.enter();
        let mut walk = core.first;
        while let Some(index) = walk {
            let cell = core.cell(index);
            f(&cell.element);
            walk = cell.next;
        }
    }

    /// Clone the elements into a `Vec`, front-to-back.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::with_capacity(self.monitor.enter().len as usize);
        self.for_each(|element| out.push(element.clone()));
        out
    }

    /// Iterate clones of the elements front-to-back.
    ///
    /// The iterator **holds the list's monitor** for its entire
    /// lifetime: other threads block on any list operation until it is
    /// dropped, and calling another method on the same list from the
    /// same thread panics (monitor re-entry).
    pub fn iter(&self) -> Iter<'_, T>
    where
        T: Clone,
    {
        let guard = self.monitor.enter();
        let cursor = guard.first;
        Iter { guard, cursor }
    }

    /// Exchange the entire contents (nodes, length, storage identity)
    /// with `other` in O(1).
    ///
    /// Both monitors are taken in [`MonitorId`](keel_core::MonitorId)
    /// order, so two threads swapping the same pair in opposite
    /// directions cannot deadlock. Outstanding cursors follow their
    /// nodes to the destination list.
    pub fn swap(&self, other: &List<T>) {
        if std::ptr::eq(self, other) {
            return;
        }
        let (mut mine, mut theirs) = Monitor::enter_both(&self.monitor, &other.monitor);
        std::mem::swap(&mut *mine, &mut *theirs);
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.monitor.enter();
        f.debug_struct("List")
            .field("id", &core.id)
            .field("len", &core.len)
            .finish()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let list = List::new();
        {
            let mut core = list.monitor.enter();
            for element in iter {
                core.push_back(element)
                    .expect("slab growth failed while collecting into List");
            }
        }
        list
    }
}

// Compile-time assertion: List must be shareable across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<List<u32>>();
};

/// Lock-holding cloning iterator over a [`List`]. See [`List::iter`].
pub struct Iter<'a, T> {
    guard: MonitorGuard<'a, ListCore<T>>,
    cursor: Option<u32>,
}

impl<T: Clone> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let index = self.cursor?;
        let cell = self.guard.cell(index);
        self.cursor = cell.next;
        Some(cell.element.clone())
    }
}
