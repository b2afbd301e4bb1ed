//! Doubly-linked list over a sentinel ring.
//!
//! Every element lives in its own node, allocated through the list's
//! [`Allocator`]. Nodes hang off a heap-allocated sentinel that marks both
//! ends, so `end()` is a real position and moving the list value never
//! touches the ring.
//!
//! # Position Invariant
//!
//! A [`ListPos`] names a node and does not borrow the list. It may only be
//! passed to the list that currently holds its node, and only while that
//! node is alive. Passing a position from another list, or one whose node
//! was erased, is undefined behavior. This is the caller's responsibility
//! to enforce. Debug builds check membership on every call that changes the
//! list and panic; the `check-invariants` feature extends the check to
//! [`next`](LinkedList::next), [`prev`](LinkedList::prev) and
//! [`get`](LinkedList::get).
//!
//! Positions survive everything except erasing their own node: inserts,
//! other erases, [`sort`](LinkedList::sort), [`reverse`](LinkedList::reverse)
//! and moves into another list by [`splice`](LinkedList::splice) or
//! [`merge`](LinkedList::merge) (after which the position belongs to the
//! receiving list).
//!
//! # Allocator Compatibility
//!
//! Splice, merge and swap hand nodes from one list to another. Both lists
//! use the same allocator type, and every instance of that type must be able
//! to free nodes allocated by any other.
//!
//! # Example
//!
//! ```
//! use nexus_seq::LinkedList;
//!
//! let mut list = LinkedList::from([1, 2, 3, 4]);
//! let mut donor = LinkedList::from([4, 3, 2, 1]);
//!
//! let first = list.begin();
//! list.splice(list.begin(), &mut donor);
//! assert_eq!(list, [4, 3, 2, 1, 1, 2, 3, 4]);
//! assert!(donor.is_empty());
//!
//! // `first` still names the node holding 1
//! assert_eq!(list.get(first), Some(&1));
//! ```
//!
//! # Merging
//!
//! ```
//! use nexus_seq::LinkedList;
//!
//! let mut odd = LinkedList::from([1, 3, 5]);
//! let mut even = LinkedList::from([2, 4, 6, 8]);
//! odd.merge(&mut even);
//! assert_eq!(odd, [1, 2, 3, 4, 5, 6, 8]);
//! assert!(even.is_empty());
//! ```

use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

use log::debug;

use crate::alloc::{Allocator, BlockGuard, Global};
use crate::error::infallible;
use crate::ring::{self, Link, Node, NodeRing};
use crate::{DynamicArray, ListPos, Result};

/// A doubly-linked list with O(1) insert, erase, splice and swap at any
/// position.
///
/// # Example
///
/// ```
/// use nexus_seq::LinkedList;
///
/// let mut list = LinkedList::new();
/// list.push_back("b");
/// list.push_front("a");
/// let c = list.insert(list.end(), "c");
///
/// assert_eq!(list.get(c), Some(&"c"));
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
///
/// let after = list.erase(list.begin());
/// assert_eq!(list.get(after), Some(&"b"));
/// assert_eq!(list.pop_back(), Some("c"));
/// ```
pub struct LinkedList<T, A: Allocator = Global> {
    ring: NodeRing<T>,
    alloc: A,
}

// Safety: the list owns its nodes exclusively; positions carry no access
unsafe impl<T: Send, A: Allocator + Send> Send for LinkedList<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for LinkedList<T, A> {}

impl<T> LinkedList<T> {
    /// Creates an empty list. Allocates the sentinel.
    #[inline]
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates a list of `n` default values.
    pub fn with_default(n: usize) -> Self
    where
        T: Default,
    {
        let mut list = Self::new();
        for _ in 0..n {
            list.emplace_back_with(T::default);
        }
        list
    }

    /// Creates a list of `n` clones of `value`.
    pub fn from_elem(value: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut list = Self::new();
        for _ in 0..n {
            list.push_back(value.clone());
        }
        list
    }
}

impl<T, A: Allocator> LinkedList<T, A> {
    /// Creates an empty list using `alloc`.
    #[inline]
    pub fn new_in(alloc: A) -> Self {
        infallible(Self::try_new_in(alloc))
    }

    /// Fallible [`new_in`](LinkedList::new_in).
    pub fn try_new_in(mut alloc: A) -> Result<Self> {
        let ring = NodeRing::new_in(&mut alloc)?;
        Ok(Self { ring, alloc })
    }

    /// Returns the allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    // =========================================================================
    // Node lifecycle
    // =========================================================================

    /// Allocates a node and builds its value with `make`.
    ///
    /// The node is not linked. If `make` panics the block is freed.
    fn create_node(&mut self, make: impl FnOnce() -> T) -> Result<NonNull<Link>> {
        let mut guard = BlockGuard::<Node<T>, A>::allocate(&mut self.alloc, 1)?;
        guard.push(Node::unlinked(make()));
        Ok(guard.finish().cast())
    }

    /// Unlinks `link`, frees its node and returns the value.
    ///
    /// # Safety
    ///
    /// `link` is a node of this list.
    unsafe fn remove_node(&mut self, link: NonNull<Link>) -> T {
        unsafe {
            self.ring.unlink(link);
            let node = link.cast::<Node<T>>();
            let value = ptr::read(&raw const (*node.as_ptr()).value);
            self.alloc.deallocate_array(node, 1);
            value
        }
    }

    /// Unlinks `link`, destroys its value and frees its node.
    ///
    /// # Safety
    ///
    /// `link` is a node of this list.
    unsafe fn destroy_node(&mut self, link: NonNull<Link>) {
        unsafe {
            self.ring.unlink(link);
            self.free_node(link);
        }
    }

    /// Destroys the value of a detached node and frees it.
    ///
    /// # Safety
    ///
    /// `link` is a live node owned by this list and hooked into no ring.
    unsafe fn free_node(&mut self, link: NonNull<Link>) {
        // A panicking destructor leaks the node; it is already detached.
        drop(BlockGuard::<Node<T>, A> {
            alloc: &mut self.alloc,
            ptr: link.cast(),
            capacity: 1,
            initialized: 1,
        });
    }

    /// Builds a node with `make` and links it before `link`.
    fn emplace_before(&mut self, link: NonNull<Link>, make: impl FnOnce() -> T) -> Result<NonNull<Link>> {
        let node = self.create_node(make)?;
        // Safety: link is in this ring; node is fresh and detached
        unsafe { self.ring.link_before(link, node) };
        Ok(node)
    }

    /// The value at `link`, or `None` for the sentinel.
    #[inline]
    fn value_at(&self, link: NonNull<Link>) -> Option<&T> {
        if link == self.ring.sentinel() {
            return None;
        }
        // Safety: link is a live node of this list
        Some(unsafe { Node::value(link) })
    }

    /// Mutable [`value_at`](LinkedList::value_at).
    #[inline]
    fn value_at_mut(&mut self, link: NonNull<Link>) -> Option<&mut T> {
        if link == self.ring.sentinel() {
            return None;
        }
        // Safety: link is a live node; &mut self makes the borrow unique
        Some(unsafe { Node::value_mut(link) })
    }

    /// Unlinks a node (not the sentinel) and returns its value.
    #[inline]
    fn take_at(&mut self, link: NonNull<Link>) -> Option<T> {
        if link == self.ring.sentinel() {
            return None;
        }
        // Safety: link is a node of this list
        Some(unsafe { self.remove_node(link) })
    }

    /// Panics in debug builds if `pos` is not a position of this list.
    #[inline]
    fn check_pos(&self, pos: ListPos<T>) {
        debug_assert!(
            self.ring.contains(pos.link),
            "position does not belong to this list"
        );
    }

    /// Membership check for read-only walks. O(n), so only with
    /// `check-invariants`; a walk would otherwise be quadratic.
    #[inline]
    fn check_walk_pos(&self, pos: ListPos<T>) {
        if cfg!(feature = "check-invariants") {
            assert!(
                self.ring.contains(pos.link),
                "position does not belong to this list"
            );
        }
    }

    // =========================================================================
    // Size
    // =========================================================================

    /// Number of elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` if the list has no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    /// Largest length the list could theoretically reach.
    #[inline]
    pub const fn max_size(&self) -> usize {
        isize::MAX as usize / mem::size_of::<Node<T>>()
    }

    // =========================================================================
    // Positions and access
    // =========================================================================

    /// Position of the first element (equal to `end()` when empty).
    #[inline]
    pub fn begin(&self) -> ListPos<T> {
        ListPos::new(self.ring.first())
    }

    /// The end marker, one past the last element.
    ///
    /// Stays the same for the lifetime of the list.
    #[inline]
    pub fn end(&self) -> ListPos<T> {
        ListPos::new(self.ring.sentinel())
    }

    /// Position after `pos`. Wraps from the last element to `end()` and from
    /// `end()` to the first element.
    #[inline]
    pub fn next(&self, pos: ListPos<T>) -> ListPos<T> {
        self.check_walk_pos(pos);
        // Safety: pos belongs to this list (position invariant)
        ListPos::new(unsafe { ring::next(pos.link) })
    }

    /// Position before `pos`. Wraps like [`next`](LinkedList::next).
    #[inline]
    pub fn prev(&self, pos: ListPos<T>) -> ListPos<T> {
        self.check_walk_pos(pos);
        // Safety: pos belongs to this list (position invariant)
        ListPos::new(unsafe { ring::prev(pos.link) })
    }

    /// Returns `true` if `pos` is `end()` or names a node of this list.
    ///
    /// O(n). Safe to call with any position, including stale ones.
    pub fn contains_pos(&self, pos: ListPos<T>) -> bool {
        self.ring.contains(pos.link)
    }

    /// The element at `pos`, or `None` at `end()`.
    #[inline]
    pub fn get(&self, pos: ListPos<T>) -> Option<&T> {
        self.check_walk_pos(pos);
        self.value_at(pos.link)
    }

    /// The element at `pos` mutably, or `None` at `end()`.
    #[inline]
    pub fn get_mut(&mut self, pos: ListPos<T>) -> Option<&mut T> {
        self.check_walk_pos(pos);
        self.value_at_mut(pos.link)
    }

    /// First element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.value_at(self.ring.first())
    }

    /// First element, mutably.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.value_at_mut(self.ring.first())
    }

    /// Last element.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.value_at(self.ring.last())
    }

    /// Last element, mutably.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.value_at_mut(self.ring.last())
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Inserts `value` before `pos` and returns its position.
    #[inline]
    pub fn insert(&mut self, pos: ListPos<T>, value: T) -> ListPos<T> {
        infallible(self.try_insert(pos, value))
    }

    /// Fallible [`insert`](LinkedList::insert). On error `value` is dropped
    /// and the list is unchanged.
    #[inline]
    pub fn try_insert(&mut self, pos: ListPos<T>, value: T) -> Result<ListPos<T>> {
        self.try_emplace_with(pos, move || value)
    }

    /// Inserts the value built by `make` before `pos` and returns its
    /// position.
    #[inline]
    pub fn emplace_with(&mut self, pos: ListPos<T>, make: impl FnOnce() -> T) -> ListPos<T> {
        infallible(self.try_emplace_with(pos, make))
    }

    /// Fallible [`emplace_with`](LinkedList::emplace_with). `make` is not
    /// called if the node cannot be allocated.
    pub fn try_emplace_with(
        &mut self,
        pos: ListPos<T>,
        make: impl FnOnce() -> T,
    ) -> Result<ListPos<T>> {
        self.check_pos(pos);
        self.emplace_before(pos.link, make).map(ListPos::new)
    }

    /// Appends `value`.
    #[inline]
    pub fn push_back(&mut self, value: T) {
        infallible(self.try_push_back(value))
    }

    /// Fallible [`push_back`](LinkedList::push_back).
    #[inline]
    pub fn try_push_back(&mut self, value: T) -> Result<()> {
        self.emplace_before(self.ring.sentinel(), move || value).map(|_| ())
    }

    /// Prepends `value`.
    #[inline]
    pub fn push_front(&mut self, value: T) {
        infallible(self.try_push_front(value))
    }

    /// Fallible [`push_front`](LinkedList::push_front).
    #[inline]
    pub fn try_push_front(&mut self, value: T) -> Result<()> {
        self.emplace_before(self.ring.first(), move || value).map(|_| ())
    }

    /// Appends the value built by `make` and returns it.
    #[inline]
    pub fn emplace_back_with(&mut self, make: impl FnOnce() -> T) -> &mut T {
        let node = infallible(self.emplace_before(self.ring.sentinel(), make));
        // Safety: node was just linked into this list
        unsafe { Node::value_mut(node) }
    }

    /// Prepends the value built by `make` and returns it.
    #[inline]
    pub fn emplace_front_with(&mut self, make: impl FnOnce() -> T) -> &mut T {
        let node = infallible(self.emplace_before(self.ring.first(), make));
        // Safety: node was just linked into this list
        unsafe { Node::value_mut(node) }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Destroys the element at `pos` and returns the following position.
    ///
    /// `erase(end())` is a no-op returning `end()`. Only `pos` is
    /// invalidated.
    pub fn erase(&mut self, pos: ListPos<T>) -> ListPos<T> {
        self.check_pos(pos);
        if pos.link == self.ring.sentinel() {
            return pos;
        }
        // Safety: pos names a live node of this list
        unsafe {
            let following = ring::next(pos.link);
            self.destroy_node(pos.link);
            ListPos::new(following)
        }
    }

    /// Unlinks the element at `pos` and hands it back. `None` at `end()`.
    pub fn remove(&mut self, pos: ListPos<T>) -> Option<T> {
        self.check_pos(pos);
        self.take_at(pos.link)
    }

    /// Removes and returns the first element.
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        self.take_at(self.ring.first())
    }

    /// Removes and returns the last element.
    #[inline]
    pub fn pop_back(&mut self) -> Option<T> {
        self.take_at(self.ring.last())
    }

    /// Destroys every element.
    pub fn clear(&mut self) {
        // Detach first: a panicking destructor then leaks the rest instead of
        // leaving the ring pointing at freed nodes.
        let (mut link, count) = self.ring.reset();
        for _ in 0..count {
            // Safety: detached nodes are owned here and visited once
            unsafe {
                let following = ring::next(link);
                self.free_node(link);
                link = following;
            }
        }
    }

    // =========================================================================
    // Splicing
    // =========================================================================

    /// Moves every element of `other` before `pos` in O(1).
    ///
    /// `other` is left empty. Positions into `other` now belong to this list.
    pub fn splice(&mut self, pos: ListPos<T>, other: &mut Self) {
        self.check_pos(pos);
        // Safety: pos is in this ring; other is a distinct list
        unsafe { self.ring.splice_all(pos.link, &mut other.ring) };
    }

    /// Moves the element at `it` from `other` to just before `pos` in O(1).
    ///
    /// `it == other.end()` is a no-op.
    pub fn splice_one(&mut self, pos: ListPos<T>, other: &mut Self, it: ListPos<T>) {
        self.check_pos(pos);
        other.check_pos(it);
        if it.link == other.ring.sentinel() {
            return;
        }
        // Safety: pos in this ring; it is a node of the distinct other ring
        unsafe { self.ring.splice_one(pos.link, &mut other.ring, it.link) };
    }

    /// Moves `[first, last)` from `other` to just before `pos`.
    ///
    /// Relinking is O(1); counting the moved nodes is O(k). Returns how many
    /// elements moved. An empty range, a backward range and a range starting
    /// at `other.end()` are no-ops returning 0.
    pub fn splice_range(
        &mut self,
        pos: ListPos<T>,
        other: &mut Self,
        first: ListPos<T>,
        last: ListPos<T>,
    ) -> usize {
        self.check_pos(pos);
        other.check_pos(first);
        other.check_pos(last);
        // Safety: pos in this ring; first and last are links of other
        unsafe {
            self.ring
                .splice_range(pos.link, &mut other.ring, first.link, last.link)
        }
    }

    /// Moves the element at `it` to just before `pos` within this list.
    ///
    /// No-op when `it` is `end()` or already sits before `pos`.
    pub fn move_before(&mut self, pos: ListPos<T>, it: ListPos<T>) {
        self.check_pos(pos);
        self.check_pos(it);
        if it.link == self.ring.sentinel() {
            return;
        }
        // Safety: both in this ring and it is a node
        unsafe { self.ring.relocate(pos.link, it.link) };
    }

    /// Merges the sorted `other` into this sorted list using `<`.
    ///
    /// See [`merge_by`](LinkedList::merge_by).
    #[inline]
    pub fn merge(&mut self, other: &mut Self)
    where
        T: PartialOrd,
    {
        self.merge_by(other, |a, b| a < b);
    }

    /// Merges the sorted `other` into this sorted list.
    ///
    /// Both lists must be ascending under `less`. Nodes are relinked, never
    /// copied, and ties keep this list's elements first. Once this list is
    /// exhausted the rest of `other` moves over in one step. `other` ends
    /// up empty.
    pub fn merge_by(&mut self, other: &mut Self, mut less: impl FnMut(&T, &T) -> bool) {
        let end = self.ring.sentinel();
        let mut cursor = self.ring.first();
        while other.ring.len() > 0 {
            if cursor == end {
                // Safety: end is in this ring; other is distinct
                unsafe { self.ring.splice_all(end, &mut other.ring) };
                break;
            }
            let candidate = other.ring.first();
            // Safety: cursor and candidate are live nodes of their lists
            unsafe {
                if less(Node::value(candidate), Node::value(cursor)) {
                    self.ring.splice_one(cursor, &mut other.ring, candidate);
                } else {
                    cursor = ring::next(cursor);
                }
            }
        }
        self.ring.check();
    }

    // =========================================================================
    // Algorithms
    // =========================================================================

    /// Sorts ascending with `<`. Stable.
    #[inline]
    pub fn sort(&mut self)
    where
        T: PartialOrd,
    {
        self.sort_by(|a, b| a < b);
    }

    /// Sorts by `less`. Stable.
    ///
    /// Nodes are relinked in the new order; values never move, so every
    /// position stays valid and keeps naming the same value. If `less`
    /// panics the list keeps its previous order.
    pub fn sort_by(&mut self, mut less: impl FnMut(&T, &T) -> bool) {
        if self.len() < 2 {
            return;
        }
        debug!("sorting list of {} nodes", self.len());
        let mut order: DynamicArray<NonNull<Link>> = DynamicArray::with_capacity(self.len());
        let mut link = self.ring.first();
        while link != self.ring.sentinel() {
            order.push_back(link);
            // Safety: walking this ring's live links
            link = unsafe { ring::next(link) };
        }
        order.sort_by(|&a, &b| {
            // Safety: both are live nodes of this list
            let (a, b) = unsafe { (Node::<T>::value(a), Node::<T>::value(b)) };
            if less(a, b) {
                core::cmp::Ordering::Less
            } else if less(b, a) {
                core::cmp::Ordering::Greater
            } else {
                core::cmp::Ordering::Equal
            }
        });
        // Safety: order is a permutation of this ring's nodes
        unsafe { self.ring.relink(order.as_slice()) };
    }

    /// Reverses the order of the elements in O(n). Positions stay valid.
    #[inline]
    pub fn reverse(&mut self) {
        self.ring.reverse();
    }

    /// Removes consecutive equal elements, keeping the first of each run.
    ///
    /// Returns how many elements were removed.
    #[inline]
    pub fn unique(&mut self) -> usize
    where
        T: PartialEq,
    {
        self.unique_by(|a, b| a == b)
    }

    /// Removes every element `same` reports equal to the kept element before
    /// it. Returns how many elements were removed.
    pub fn unique_by(&mut self, mut same: impl FnMut(&T, &T) -> bool) -> usize {
        let end = self.ring.sentinel();
        let mut removed = 0;
        let mut kept = self.ring.first();
        if kept == end {
            return 0;
        }
        loop {
            // Safety: kept is a live node; candidate is live or the sentinel
            unsafe {
                let candidate = ring::next(kept);
                if candidate == end {
                    break;
                }
                if same(Node::value(kept), Node::value(candidate)) {
                    self.destroy_node(candidate);
                    removed += 1;
                } else {
                    kept = candidate;
                }
            }
        }
        removed
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Exchanges contents and allocators with `other` in O(1).
    ///
    /// Each list keeps its own `end()`; positions of elements follow the
    /// elements.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        self.ring.swap_chains(&mut other.ring);
        mem::swap(&mut self.alloc, &mut other.alloc);
    }

    /// Moves the contents out, leaving this list empty.
    pub fn take(&mut self) -> Self
    where
        A: Clone,
    {
        let mut taken = Self::new_in(self.alloc.clone());
        taken.swap(self);
        taken
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Front-to-back iterator.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            front: self.ring.first(),
            back: self.ring.last(),
            remaining: self.len(),
            _marker: PhantomData,
        }
    }

    /// Front-to-back iterator over mutable references.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            front: self.ring.first(),
            back: self.ring.last(),
            remaining: self.len(),
            _marker: PhantomData,
        }
    }
}

impl<T, A: Allocator> Drop for LinkedList<T, A> {
    fn drop(&mut self) {
        self.clear();
        // Safety: empty ring; the sentinel came from this allocator type
        unsafe { self.ring.release(&mut self.alloc) };
    }
}

// =============================================================================
// Traits
// =============================================================================

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for LinkedList<T, A> {
    fn clone(&self) -> Self {
        let mut copy = Self::new_in(self.alloc.clone());
        copy.extend(self.iter().cloned());
        copy
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for LinkedList<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<LinkedList<T, B>> for LinkedList<T, A> {
    fn eq(&self, other: &LinkedList<T, B>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: PartialEq, A: Allocator, const N: usize> PartialEq<[T; N]> for LinkedList<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.len() == N && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator> Eq for LinkedList<T, A> {}

impl<T: Hash, A: Allocator> Hash for LinkedList<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for value in self.iter() {
            value.hash(state);
        }
    }
}

impl<T, const N: usize> From<[T; N]> for LinkedList<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T> FromIterator<T> for LinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T, A: Allocator> Extend<T> for LinkedList<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for LinkedList<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a LinkedList<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut LinkedList<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, A: Allocator> IntoIterator for LinkedList<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    #[inline]
    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter { list: self }
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Iterator over `&T`, created by [`LinkedList::iter`].
pub struct Iter<'a, T> {
    front: NonNull<Link>,
    back: NonNull<Link>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // Safety: remaining > 0 so front is a live node, borrowed for 'a
        unsafe {
            let value = Node::value(self.front);
            self.front = ring::next(self.front);
            Some(value)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // Safety: remaining > 0 so back is a live node
        unsafe {
            let value = Node::value(self.back);
            self.back = ring::prev(self.back);
            Some(value)
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Iterator over `&mut T`, created by [`LinkedList::iter_mut`].
pub struct IterMut<'a, T> {
    front: NonNull<Link>,
    back: NonNull<Link>,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // Safety: each node is yielded once, so the &mut borrows never alias
        unsafe {
            let value = Node::value_mut(self.front);
            self.front = ring::next(self.front);
            Some(value)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // Safety: as for next; front and back never cross
        unsafe {
            let value = Node::value_mut(self.back);
            self.back = ring::prev(self.back);
            Some(value)
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator, created by [`LinkedList::into_iter`].
pub struct IntoIter<T, A: Allocator = Global> {
    list: LinkedList<T, A>,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}
