//! Growable contiguous array.
//!
//! [`DynamicArray`] stores its elements in one [`StorageBuffer`] block and
//! addresses them with [`ArrayPos`] positions. Capacity grows by doubling
//! (`0 -> 1 -> 2 -> 4 -> ...`) unless [`reserve`](DynamicArray::reserve)
//! asks for more.
//!
//! # Positions
//!
//! Positions are indices. Any call that may grow, shift or shrink storage
//! leaves earlier positions pointing at whatever now occupies their index.
//! Positions outside `[begin(), end()]` handed to `insert`, `emplace_with`
//! or `erase` make the call a no-op that returns the given position:
//!
//! ```
//! use nexus_seq::DynamicArray;
//!
//! let mut array = DynamicArray::from([1, 2, 3]);
//! let outside = array.end() + 1;
//! assert_eq!(array.insert(outside, 4), outside);
//! assert_eq!(array.erase(array.end()), array.end());
//! assert_eq!(array, [1, 2, 3]);
//! ```
//!
//! # Failure
//!
//! Every reallocating operation is all-or-nothing. If the allocator refuses
//! (the `try_*` forms return [`Error::OutOfMemory`]) or the element
//! constructor panics, the array keeps its previous elements, capacity and
//! block.
//!
//! # Example
//!
//! ```
//! use nexus_seq::DynamicArray;
//!
//! let mut array = DynamicArray::new();
//! for i in 1..=5 {
//!     array.push_back(i);
//! }
//! assert_eq!(array.capacity(), 8);
//!
//! let pos = array.insert(array.begin() + 2, 10);
//! assert_eq!(array[pos.index()], 10);
//! assert_eq!(array, [1, 2, 10, 3, 4, 5]);
//!
//! array.erase_range(array.begin(), array.begin() + 2);
//! assert_eq!(array.as_slice(), &[10, 3, 4, 5]);
//! ```

use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use crate::alloc::{Allocator, Global};
use crate::buffer::StorageBuffer;
use crate::error::infallible;
use crate::{ArrayPos, Error, Result};

/// A growable array over a single contiguous block.
///
/// Dereferences to `[T]`, so slice methods and `array[i]` indexing work
/// directly.
pub struct DynamicArray<T, A: Allocator = Global> {
    buf: StorageBuffer<T, A>,
}

impl<T> DynamicArray<T> {
    /// Creates an empty array. Allocates nothing.
    #[inline]
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an array of `n` default values. Capacity is exactly `n`.
    pub fn with_default(n: usize) -> Self
    where
        T: Default,
    {
        Self::with_default_in(n, Global)
    }

    /// Creates an array of `n` clones of `value`. Capacity is exactly `n`.
    pub fn from_elem(value: T, n: usize) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(value, n, Global)
    }

    /// Creates an empty array with room for exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        infallible(StorageBuffer::with_capacity_in(capacity, Global).map(|buf| Self { buf }))
    }
}

impl<T, A: Allocator> DynamicArray<T, A> {
    /// Creates an empty array using `alloc`. Allocates nothing.
    #[inline]
    pub const fn new_in(alloc: A) -> Self {
        Self {
            buf: StorageBuffer::new_in(alloc),
        }
    }

    /// [`with_default`](DynamicArray::with_default) with a given allocator.
    pub fn with_default_in(n: usize, alloc: A) -> Self
    where
        T: Default,
    {
        infallible(StorageBuffer::build_in(n, alloc, |_| T::default()).map(|buf| Self { buf }))
    }

    /// [`from_elem`](DynamicArray::from_elem) with a given allocator.
    pub fn from_elem_in(value: T, n: usize, alloc: A) -> Self
    where
        T: Clone,
    {
        infallible(StorageBuffer::build_in(n, alloc, |_| value.clone()).map(|buf| Self { buf }))
    }

    /// Returns the allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    // =========================================================================
    // Size and capacity
    // =========================================================================

    /// Number of elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if there are no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of elements the current block holds.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Largest length the array could theoretically reach.
    #[inline]
    pub const fn max_size(&self) -> usize {
        let size = mem::size_of::<T>();
        if size == 0 {
            usize::MAX
        } else {
            isize::MAX as usize / size
        }
    }

    /// Ensures a total capacity of at least `capacity`.
    ///
    /// Allocates exactly `capacity` when growing and moves every element;
    /// positions taken before a growing reserve address the same indices
    /// afterwards. A request at or below the current capacity leaves the
    /// block and every element address untouched.
    #[inline]
    pub fn reserve(&mut self, capacity: usize) {
        infallible(self.try_reserve(capacity))
    }

    /// Fallible [`reserve`](DynamicArray::reserve).
    #[inline]
    pub fn try_reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity > self.max_size() {
            return Err(Error::CapacityOverflow);
        }
        self.buf.reserve_exact(capacity)
    }

    /// Reallocates to exactly `len()` slots; an empty array frees its block.
    #[inline]
    pub fn shrink_to_fit(&mut self) {
        infallible(self.try_shrink_to_fit())
    }

    /// Fallible [`shrink_to_fit`](DynamicArray::shrink_to_fit).
    #[inline]
    pub fn try_shrink_to_fit(&mut self) -> Result<()> {
        self.buf.shrink_to_fit()
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Checked access by index.
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len();
        self.buf
            .as_slice()
            .get(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// Checked mutable access by index.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len();
        self.buf
            .as_mut_slice()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// Element at `pos`, or `None` outside `[begin(), end())`.
    #[inline]
    pub fn get_at(&self, pos: ArrayPos) -> Option<&T> {
        self.buf.as_slice().get(pos.index())
    }

    /// Mutable element at `pos`, or `None` outside `[begin(), end())`.
    #[inline]
    pub fn get_at_mut(&mut self, pos: ArrayPos) -> Option<&mut T> {
        self.buf.as_mut_slice().get_mut(pos.index())
    }

    /// First element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.buf.as_slice().first()
    }

    /// First element, mutably.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.buf.as_mut_slice().first_mut()
    }

    /// Last element.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.buf.as_slice().last()
    }

    /// Last element, mutably.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.buf.as_mut_slice().last_mut()
    }

    /// Pointer to the first element. Dangling (never null) when nothing is
    /// allocated.
    #[inline]
    pub const fn data(&self) -> *const T {
        self.buf.as_ptr()
    }

    /// Same as [`data`](DynamicArray::data).
    #[inline]
    pub const fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    /// Mutable pointer to the first element.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_mut_ptr()
    }

    /// The elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.buf.as_slice()
    }

    /// The elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.buf.as_mut_slice()
    }

    /// Position of the first element (equal to `end()` when empty).
    #[inline]
    pub const fn begin(&self) -> ArrayPos {
        ArrayPos::new(0)
    }

    /// Position one past the last element.
    #[inline]
    pub const fn end(&self) -> ArrayPos {
        ArrayPos::new(self.len())
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Appends `value`, doubling capacity when full.
    #[inline]
    pub fn push_back(&mut self, value: T) {
        infallible(self.try_push_back(value))
    }

    /// Fallible [`push_back`](DynamicArray::push_back). On error `value` is
    /// dropped and the array is unchanged.
    #[inline]
    pub fn try_push_back(&mut self, value: T) -> Result<()> {
        let len = self.len();
        self.buf.emplace_with(len, move || value).map(|_| ())
    }

    /// Appends the value built by `make` and returns it.
    ///
    /// When growth is needed, the value is built in the new block before any
    /// element moves.
    #[inline]
    pub fn emplace_back_with(&mut self, make: impl FnOnce() -> T) -> &mut T {
        infallible(self.try_emplace_back_with(make))
    }

    /// Fallible [`emplace_back_with`](DynamicArray::emplace_back_with).
    /// `make` is not called if allocation fails.
    #[inline]
    pub fn try_emplace_back_with(&mut self, make: impl FnOnce() -> T) -> Result<&mut T> {
        let len = self.len();
        self.buf.emplace_with(len, make)
    }

    /// Inserts `value` before `pos` and returns the position of the new
    /// element. A position past `end()` is a no-op returning `pos`.
    #[inline]
    pub fn insert(&mut self, pos: ArrayPos, value: T) -> ArrayPos {
        infallible(self.try_insert(pos, value))
    }

    /// Fallible [`insert`](DynamicArray::insert).
    #[inline]
    pub fn try_insert(&mut self, pos: ArrayPos, value: T) -> Result<ArrayPos> {
        self.try_emplace_with(pos, move || value)
    }

    /// Inserts the value built by `make` before `pos`.
    ///
    /// A position past `end()` is a no-op returning `pos`, and `make` is
    /// never called.
    #[inline]
    pub fn emplace_with(&mut self, pos: ArrayPos, make: impl FnOnce() -> T) -> ArrayPos {
        infallible(self.try_emplace_with(pos, make))
    }

    /// Fallible [`emplace_with`](DynamicArray::emplace_with).
    pub fn try_emplace_with(&mut self, pos: ArrayPos, make: impl FnOnce() -> T) -> Result<ArrayPos> {
        if pos.index() > self.len() {
            return Ok(pos);
        }
        self.buf.emplace_with(pos.index(), make)?;
        Ok(pos)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes and returns the last element.
    #[inline]
    pub fn pop_back(&mut self) -> Option<T> {
        self.buf.pop()
    }

    /// Destroys the element at `pos` and closes the gap.
    ///
    /// Returns the position now holding the following element (or `end()`).
    /// `end()` and positions outside the array are no-ops returning `pos`.
    #[inline]
    pub fn erase(&mut self, pos: ArrayPos) -> ArrayPos {
        drop(self.remove(pos));
        pos
    }

    /// Removes the element at `pos` and hands it back.
    ///
    /// `None` for `end()` and positions outside the array.
    #[inline]
    pub fn remove(&mut self, pos: ArrayPos) -> Option<T> {
        if pos.index() >= self.len() {
            return None;
        }
        Some(self.buf.remove(pos.index()))
    }

    /// Destroys `[first, last)` and shifts the tail down.
    ///
    /// Returns `first`, which now holds the element that followed the range.
    /// An empty, inverted or out-of-range span is a no-op returning `first`.
    pub fn erase_range(&mut self, first: ArrayPos, last: ArrayPos) -> ArrayPos {
        if first >= last || last.index() > self.len() {
            return first;
        }
        self.buf.erase(first.index(), last.index());
        first
    }

    /// Shortens the array to `len` elements. No-op if already shorter.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Destroys every element. Capacity is unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Exchanges contents, capacities and allocators with `other`.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.buf, &mut other.buf);
    }

    /// Moves the contents out, leaving this array empty with no block.
    #[inline]
    pub fn take(&mut self) -> Self
    where
        A: Clone,
    {
        let empty = Self::new_in(self.allocator().clone());
        mem::replace(self, empty)
    }
}

// =============================================================================
// Traits
// =============================================================================

impl<T, A: Allocator> Deref for DynamicArray<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.buf.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for DynamicArray<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.buf.as_mut_slice()
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for DynamicArray<T, A> {
    /// Deep copy with the same capacity.
    fn clone(&self) -> Self {
        Self {
            buf: infallible(self.buf.try_clone()),
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for DynamicArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<DynamicArray<T, B>> for DynamicArray<T, A> {
    fn eq(&self, other: &DynamicArray<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq, A: Allocator, const N: usize> PartialEq<[T; N]> for DynamicArray<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, A: Allocator> PartialEq<[T]> for DynamicArray<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq, A: Allocator> Eq for DynamicArray<T, A> {}

impl<T: Hash, A: Allocator> Hash for DynamicArray<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T, const N: usize> From<[T; N]> for DynamicArray<T> {
    /// Capacity equals `N`.
    fn from(values: [T; N]) -> Self {
        let mut array = Self::with_capacity(N);
        for value in values {
            array.push_back(value);
        }
        array
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<T, A: Allocator> Extend<T> for DynamicArray<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        infallible(self.buf.reserve_for(lower));
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for DynamicArray<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a DynamicArray<T, A> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut DynamicArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, A: Allocator> IntoIterator for DynamicArray<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let Self { mut buf } = self;
        let tail = buf.len();
        // Safety: ownership of [0, tail) moves to the iterator
        unsafe { buf.set_len(0) };
        IntoIter { buf, head: 0, tail }
    }
}

/// Owning iterator over a [`DynamicArray`].
pub struct IntoIter<T, A: Allocator = Global> {
    buf: StorageBuffer<T, A>,
    head: usize,
    tail: usize,
}

impl<T, A: Allocator> IntoIter<T, A> {
    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // Safety: [head, tail) is still initialized and owned by the iterator
        unsafe { core::slice::from_raw_parts(self.buf.as_ptr().add(self.head), self.tail - self.head) }
    }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        // Safety: head < tail, slot initialized and read exactly once
        let value = unsafe { ptr::read(self.buf.as_ptr().add(self.head)) };
        self.head += 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.tail - self.head;
        (n, Some(n))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        // Safety: tail was in [head, tail), read exactly once
        Some(unsafe { ptr::read(self.buf.as_ptr().add(self.tail)) })
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        // Safety: [head, tail) not yet yielded; the buffer's len is 0 so it
        // only frees the block afterwards
        unsafe {
            let rest = ptr::slice_from_raw_parts_mut(
                self.buf.as_mut_ptr().add(self.head),
                self.tail - self.head,
            );
            self.head = self.tail;
            self.buf.allocator_mut().destroy(NonNull::new_unchecked(rest));
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
