//! Contiguous growable array with a pluggable growth strategy.
//!
//! [`Array`] performs **no internal locking**: mutation takes `&mut self`,
//! making single-threaded or externally-synchronized use a compile-time
//! fact rather than a convention. For an explicitly shared array, wrap it
//! in [`SyncArray`](crate::SyncArray).

use crate::error::ArrayError;
use crate::strategy::GrowthStrategy;

/// A contiguous growable sequence.
///
/// Tracks a `sorted` flag: it is `true` only when the stored elements are
/// known to be in non-decreasing order under `<`. Insertions clear it
/// conservatively; [`sort`](Array::sort) establishes it.
///
/// Growth reallocates to the capacity computed by the array's
/// [`GrowthStrategy`]; allocation failure is reported as
/// [`ArrayError::AllocationFailed`] instead of aborting.
///
/// # Examples
///
/// ```
/// use keel_collections::Array;
///
/// let mut a = Array::new();
/// a.push_back(3).unwrap();
/// a.push_back(1).unwrap();
/// a.push_back(2).unwrap();
/// assert_eq!(a.len(), 3);
///
/// a.sort();
/// assert_eq!(a.as_slice(), &[1, 2, 3]);
/// assert_eq!(a.binary_search(&2), Some(1));
/// assert_eq!(a.binary_search(&5), None);
/// ```
#[derive(Debug)]
pub struct Array<T> {
    data: Vec<T>,
    strategy: GrowthStrategy,
    sorted: bool,
}

impl<T> Array<T> {
    /// Create an empty array with the default growth strategy.
    pub fn new() -> Self {
        Self::with_strategy(GrowthStrategy::default())
    }

    /// Create an empty array with the given growth strategy.
    pub fn with_strategy(strategy: GrowthStrategy) -> Self {
        Self {
            data: Vec::new(),
            strategy,
            sorted: true,
        }
    }

    /// Create an empty array with `capacity` elements preallocated.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::AllocationFailed`] if the buffer cannot be
    /// allocated.
    pub fn with_capacity(capacity: u32) -> Result<Self, ArrayError> {
        let mut array = Self::new();
        array
            .data
            .try_reserve_exact(capacity as usize)
            .map_err(|_| ArrayError::AllocationFailed {
                requested: capacity as usize,
            })?;
        Ok(array)
    }

    /// Logical number of elements.
    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current buffer capacity in elements. Always `>= len()`.
    pub fn allocated(&self) -> u32 {
        self.data.capacity() as u32
    }

    /// The growth strategy chosen at construction.
    pub fn strategy(&self) -> GrowthStrategy {
        self.strategy
    }

    /// Whether the elements are known to be in non-decreasing order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Shared view of the elements.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterator over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Element at `index`, or `None` out of range.
    pub fn get(&self, index: u32) -> Option<&T> {
        self.data.get(index as usize)
    }

    /// Mutable element at `index`, or `None` out of range.
    ///
    /// Mutating an element can invalidate ordering, so this clears the
    /// sorted flag.
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        let element = self.data.get_mut(index as usize)?;
        self.sorted = false;
        Some(element)
    }

    /// Ensure capacity for one more element, reallocating per the growth
    /// strategy if needed.
    fn grow_for_insert(&mut self) -> Result<(), ArrayError> {
        let used = self.data.len();
        if used + 1 <= self.data.capacity() {
            return Ok(());
        }
        let target = self
            .strategy
            .grown_capacity(used as u32, self.data.capacity() as u32)
            as usize;
        self.data
            .try_reserve_exact(target - used)
            .map_err(|_| ArrayError::AllocationFailed { requested: target })
    }

    /// Append an element.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::AllocationFailed`] if growth fails.
    pub fn push_back(&mut self, element: T) -> Result<(), ArrayError> {
        self.grow_for_insert()?;
        self.data.push(element);
        self.sorted = self.data.len() <= 1;
        Ok(())
    }

    /// Prepend an element. O(n): shifts every existing element.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::AllocationFailed`] if growth fails.
    pub fn push_front(&mut self, element: T) -> Result<(), ArrayError> {
        self.insert(0, element)
    }

    /// Insert at `index`, shifting trailing elements. `index == len()`
    /// appends.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::OutOfRange`] if `index > len()`, or
    /// [`ArrayError::AllocationFailed`] if growth fails.
    pub fn insert(&mut self, index: u32, element: T) -> Result<(), ArrayError> {
        if index > self.len() {
            return Err(ArrayError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        self.grow_for_insert()?;
        self.data.insert(index as usize, element);
        self.sorted = self.data.len() <= 1;
        Ok(())
    }

    /// Remove and return the element at `index`, shifting trailing
    /// elements. Erasure preserves relative order, so the sorted flag
    /// is unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::OutOfRange`] if `index >= len()`.
    pub fn erase(&mut self, index: u32) -> Result<T, ArrayError> {
        if index >= self.len() {
            return Err(ArrayError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.data.remove(index as usize))
    }

    /// Remove `count` contiguous elements starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::OutOfRange`] if the run extends past the end.
    pub fn erase_range(&mut self, index: u32, count: u32) -> Result<(), ArrayError> {
        let len = self.len();
        let end = index.checked_add(count).ok_or(ArrayError::OutOfRange {
            index: u32::MAX,
            len,
        })?;
        if index > len || end > len {
            return Err(ArrayError::OutOfRange { index: end, len });
        }
        self.data.drain(index as usize..end as usize);
        Ok(())
    }

    /// Set the logical length. Shrinking truncates; growing appends
    /// default-constructed elements (which clears the sorted flag).
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::AllocationFailed`] if growth fails.
    pub fn set_used(&mut self, used: u32) -> Result<(), ArrayError>
    where
        T: Default,
    {
        let target = used as usize;
        if target <= self.data.len() {
            self.data.truncate(target);
            return Ok(());
        }
        self.data
            .try_reserve_exact(target - self.data.len())
            .map_err(|_| ArrayError::AllocationFailed { requested: target })?;
        self.data.resize_with(target, T::default);
        self.sorted = self.data.len() <= 1;
        Ok(())
    }

    /// Remove every element. Keeps the buffer.
    pub fn clear(&mut self) {
        self.data.clear();
        self.sorted = true;
    }

    /// Sort in place with an in-place heap-sort: O(n log n) worst case,
    /// no scratch allocation, not stable. No-op when the array is
    /// already flagged sorted.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        if self.sorted {
            return;
        }
        heapsort(&mut self.data);
        self.sorted = true;
    }

    /// Binary search, force-sorting first.
    ///
    /// Returns the index of the first element equal to `element`, or
    /// `None` if absent. The comparison uses only `<`, never `==`.
    pub fn binary_search(&mut self, element: &T) -> Option<u32>
    where
        T: Ord,
    {
        self.sort();
        lower_bound(&self.data, element).map(|index| index as u32)
    }

    /// Binary search without mutating. Only O(log n) when the array is
    /// flagged sorted; otherwise this **falls back to a linear scan**,
    /// because binary search over unsorted data returns garbage.
    ///
    /// Callers that can sort should prefer [`binary_search`](Array::binary_search);
    /// this variant exists for shared-reference call sites that know (or
    /// can tolerate not knowing) the sort state.
    pub fn binary_search_sorted(&self, element: &T) -> Option<u32>
    where
        T: Ord,
    {
        if self.sorted {
            lower_bound(&self.data, element).map(|index| index as u32)
        } else {
            self.linear_search(element)
        }
    }

    /// Binary search for a run of equal elements, force-sorting first.
    ///
    /// Returns the first and last index of the run containing `element`,
    /// found by scanning outward from a binary-search hit. Useful for
    /// multiset-style duplicate lookups.
    pub fn binary_search_multi(&mut self, element: &T) -> Option<(u32, u32)>
    where
        T: Ord,
    {
        self.sort();
        let first = lower_bound(&self.data, element)?;
        let mut last = first;
        while last + 1 < self.data.len() && !(*element < self.data[last + 1]) {
            last += 1;
        }
        Some((first as u32, last as u32))
    }

    /// O(n) scan from the front for the first element equal to `element`.
    pub fn linear_search(&self, element: &T) -> Option<u32>
    where
        T: PartialEq,
    {
        self.data
            .iter()
            .position(|e| e == element)
            .map(|index| index as u32)
    }

    /// O(n) scan from the back for the last element equal to `element`.
    pub fn linear_reverse_search(&self, element: &T) -> Option<u32>
    where
        T: PartialEq,
    {
        self.data
            .iter()
            .rposition(|e| e == element)
            .map(|index| index as u32)
    }
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for Array<T> {
    fn from(data: Vec<T>) -> Self {
        let sorted = data.len() <= 1;
        Self {
            data,
            strategy: GrowthStrategy::default(),
            sorted,
        }
    }
}

impl<T: PartialEq> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T> std::ops::Index<u32> for Array<T> {
    type Output = T;

    /// Direct indexing. Panics out of range — use [`Array::get`] for
    /// caller-controlled indices.
    fn index(&self, index: u32) -> &T {
        &self.data[index as usize]
    }
}

impl<T> std::ops::IndexMut<u32> for Array<T> {
    fn index_mut(&mut self, index: u32) -> &mut T {
        self.sorted = false;
        &mut self.data[index as usize]
    }
}

impl<'a, T> IntoIterator for &'a Array<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// In-place heap-sort. O(n log n) comparisons, O(1) extra space.
fn heapsort<T: Ord>(data: &mut [T]) {
    if data.len() < 2 {
        return;
    }
    for root in (0..data.len() / 2).rev() {
        sift_down(data, root, data.len());
    }
    for end in (1..data.len()).rev() {
        data.swap(0, end);
        sift_down(data, 0, end);
    }
}

/// Restore the max-heap property for the subtree rooted at `root`,
/// considering only `data[..end]`.
fn sift_down<T: Ord>(data: &mut [T], mut root: usize, end: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && data[child] < data[child + 1] {
            child += 1;
        }
        if data[root] < data[child] {
            data.swap(root, child);
            root = child;
        } else {
            return;
        }
    }
}

/// First index whose element is not less than `element`, if that element
/// compares equal (under `!(a < b) && !(b < a)`). Uses only `<`.
fn lower_bound<T: Ord>(data: &[T], element: &T) -> Option<usize> {
    let mut lo = 0;
    let mut hi = data.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if data[mid] < *element {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo < data.len() && !(*element < data[lo]) {
        Some(lo)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn array_of(values: &[i32]) -> Array<i32> {
        Array::from(values.to_vec())
    }

    #[test]
    fn push_back_tracks_len_and_capacity() {
        let mut a = Array::new();
        for n in 0..100u32 {
            a.push_back(n).unwrap();
            assert_eq!(a.len(), n + 1);
            assert!(a.allocated() >= a.len());
        }
    }

    #[test]
    fn safe_strategy_grows_exactly() {
        let mut a = Array::with_strategy(GrowthStrategy::Safe);
        for n in 0..10u32 {
            a.push_back(n).unwrap();
            assert_eq!(a.allocated(), a.len());
        }
    }

    #[test]
    fn push_front_and_insert_preserve_order() {
        let mut a = Array::new();
        a.push_back(2).unwrap();
        a.push_front(1).unwrap();
        a.insert(2, 3).unwrap();
        assert_eq!(a.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut a = array_of(&[1, 2]);
        assert_eq!(
            a.insert(3, 9),
            Err(ArrayError::OutOfRange { index: 3, len: 2 })
        );
        // index == len is an append, not an error.
        a.insert(2, 9).unwrap();
        assert_eq!(a.as_slice(), &[1, 2, 9]);
    }

    #[test]
    fn erase_preserves_order_of_the_rest() {
        let mut a = array_of(&[10, 20, 30, 40]);
        assert_eq!(a.erase(1), Ok(20));
        assert_eq!(a.as_slice(), &[10, 30, 40]);
        assert_eq!(a.len(), 3);
        assert_eq!(
            a.erase(3),
            Err(ArrayError::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn erase_range_removes_a_run() {
        let mut a = array_of(&[1, 2, 3, 4, 5]);
        a.erase_range(1, 3).unwrap();
        assert_eq!(a.as_slice(), &[1, 5]);
        assert!(a.erase_range(1, 2).is_err());
        a.erase_range(2, 0).unwrap(); // empty run at the end is fine
    }

    #[test]
    fn set_used_truncates_and_extends() {
        let mut a = array_of(&[1, 2, 3]);
        a.set_used(1).unwrap();
        assert_eq!(a.as_slice(), &[1]);
        a.set_used(3).unwrap();
        assert_eq!(a.as_slice(), &[1, 0, 0]);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut a = array_of(&[3, 1, 2, 1]);
        a.sort();
        assert_eq!(a.as_slice(), &[1, 1, 2, 3]);
        assert!(a.is_sorted());
        a.sort();
        assert_eq!(a.as_slice(), &[1, 1, 2, 3]);
    }

    #[test]
    fn binary_search_force_sorts() {
        let mut a = array_of(&[3, 1, 2]);
        assert_eq!(a.binary_search(&2), Some(1));
        assert!(a.is_sorted());
        assert_eq!(a.binary_search(&5), None);
        assert_eq!(a.binary_search(&0), None);
    }

    #[test]
    fn binary_search_sorted_falls_back_to_linear_when_unsorted() {
        let a = array_of(&[3, 1, 2]);
        assert!(!a.is_sorted());
        // Linear fallback still finds the element at its unsorted position.
        assert_eq!(a.binary_search_sorted(&2), Some(2));

        let mut sorted = array_of(&[3, 1, 2]);
        sorted.sort();
        assert_eq!(sorted.binary_search_sorted(&2), Some(1));
    }

    #[test]
    fn binary_search_multi_reports_run_extent() {
        let mut a = array_of(&[5, 2, 5, 5, 1]);
        assert_eq!(a.binary_search_multi(&5), Some((2, 4)));
        assert_eq!(a.binary_search_multi(&1), Some((0, 0)));
        assert_eq!(a.binary_search_multi(&7), None);
    }

    #[test]
    fn linear_searches_scan_from_both_ends() {
        let a = array_of(&[1, 2, 1, 3]);
        assert_eq!(a.linear_search(&1), Some(0));
        assert_eq!(a.linear_reverse_search(&1), Some(2));
        assert_eq!(a.linear_search(&9), None);
    }

    #[test]
    fn mutation_clears_the_sorted_flag() {
        let mut a = array_of(&[1, 2, 3]);
        a.sort();
        a[1] = 9;
        assert!(!a.is_sorted());
    }

    #[test]
    fn single_element_counts_as_sorted() {
        let mut a = Array::new();
        assert!(a.is_sorted());
        a.push_back(42).unwrap();
        assert!(a.is_sorted());
        a.push_back(7).unwrap();
        assert!(!a.is_sorted());
    }

    #[test]
    fn with_capacity_preallocates() {
        let a: Array<u8> = Array::with_capacity(64).unwrap();
        assert!(a.allocated() >= 64);
        assert_eq!(a.len(), 0);
    }

    proptest! {
        #[test]
        fn sort_orders_and_preserves_multiset(values in prop::collection::vec(-100i32..100, 0..64)) {
            let mut a = Array::from(values.clone());
            a.sort();
            let mut expected = values;
            expected.sort();
            prop_assert_eq!(a.as_slice(), expected.as_slice());
        }

        #[test]
        fn binary_and_linear_search_agree_after_sorting(
            values in prop::collection::vec(-20i32..20, 0..64),
            needle in -25i32..25,
        ) {
            let mut a = Array::from(values);
            let by_binary = a.binary_search(&needle);
            let by_linear = a.linear_search(&needle);
            // Presence must agree; on a sorted array with duplicates the
            // lower bound and the first linear hit are the same index.
            prop_assert_eq!(by_binary, by_linear);
        }

        #[test]
        fn erase_keeps_relative_order(
            values in prop::collection::vec(0u8..255, 1..32),
            index_seed in 0usize..32,
        ) {
            let index = index_seed % values.len();
            let mut a = Array::from(values.clone());
            a.erase(index as u32).unwrap();
            let mut expected = values;
            expected.remove(index);
            prop_assert_eq!(a.as_slice(), expected.as_slice());
        }

        #[test]
        fn capacity_always_covers_len(values in prop::collection::vec(0u32..1000, 0..200)) {
            let mut a = Array::new();
            for v in values {
                a.push_back(v).unwrap();
                prop_assert!(a.allocated() >= a.len());
            }
        }
    }
}
