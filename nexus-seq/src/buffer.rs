//! Contiguous storage block behind [`DynamicArray`](crate::DynamicArray).
//!
//! A `StorageBuffer` owns at most one block obtained from its allocator:
//!
//! ```text
//!  ptr
//!   |
//!   v
//!   +----+----+----+----+----+----+----+----+
//!   | e0 | e1 | e2 | e3 | e4 |    |    |    |
//!   +----+----+----+----+----+----+----+----+
//!   |<-------- len -------->|
//!   |<--------------- capacity ------------->|
//! ```
//!
//! Slots `[0, len)` are initialized; slots `[len, capacity)` are allocated
//! but hold nothing. A capacity of zero owns no block and `ptr` is dangling.
//!
//! # Growth
//!
//! When an insertion finds the block full, the next capacity is `1` for an
//! empty buffer and twice the current capacity otherwise. The new element is
//! built straight into its final slot of the new block, and the old
//! elements are then moved around it in a single pass:
//!
//! ```text
//! old:  [ a | b | c | d ]            insert X at 1
//! new:  [   | X |   |   |   |   |   |   ]   (1) construct X
//! new:  [ a | X | b | c | d |   |   |   ]   (2) move prefix and suffix
//! ```
//!
//! Step (1) is the only one that runs user code. If it panics, the new block
//! is freed and the buffer still owns its old block unchanged. Step (2)
//! moves bitwise and cannot fail.

use core::marker::PhantomData;
use core::ptr::{self, NonNull};
use core::slice;

use log::{debug, trace};

use crate::alloc::{Allocator, BlockGuard, Global};
use crate::{Error, Result};

/// One owned, contiguous block with a live prefix.
pub struct StorageBuffer<T, A: Allocator = Global> {
    ptr: NonNull<T>,
    capacity: usize,
    len: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

// Safety: the buffer owns its elements exclusively
unsafe impl<T: Send, A: Allocator + Send> Send for StorageBuffer<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for StorageBuffer<T, A> {}

impl<T, A: Allocator> StorageBuffer<T, A> {
    /// Creates a buffer that owns no block.
    #[inline]
    pub const fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            len: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Creates an empty buffer owning a block of exactly `capacity` slots.
    pub fn with_capacity_in(capacity: usize, mut alloc: A) -> Result<Self> {
        let ptr = alloc.allocate_array::<T>(capacity)?;
        Ok(Self {
            ptr,
            capacity,
            len: 0,
            alloc,
            _marker: PhantomData,
        })
    }

    /// Creates a buffer of `len` elements, the i-th produced by `make(i)`.
    ///
    /// Capacity equals `len`. If `make` panics, every element built so far
    /// is destroyed and the block is freed.
    pub fn build_in(len: usize, mut alloc: A, mut make: impl FnMut(usize) -> T) -> Result<Self> {
        let mut guard = BlockGuard::<T, A>::allocate(&mut alloc, len)?;
        for i in 0..len {
            guard.push(make(i));
        }
        let ptr = guard.finish();
        Ok(Self {
            ptr,
            capacity: len,
            len,
            alloc,
            _marker: PhantomData,
        })
    }

    /// Number of initialized elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no element is initialized.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub(crate) fn allocator_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    /// Pointer to the first slot. Dangling while no block is owned.
    #[inline]
    pub const fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to the first slot. Dangling while no block is owned.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// The initialized prefix.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // Safety: [0, len) is initialized, ptr is aligned and non-null
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The initialized prefix, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: [0, len) is initialized and exclusively borrowed
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Sets the number of initialized elements.
    ///
    /// # Safety
    ///
    /// `len <= capacity` and slots `[0, len)` must be initialized. Elements
    /// at `[len, old_len)` are forgotten, not dropped.
    #[inline]
    pub(crate) unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity);
        self.len = len;
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    /// Capacity the next growth step would allocate.
    #[inline]
    pub fn next_capacity(&self) -> Result<usize> {
        if self.capacity == 0 {
            Ok(1)
        } else {
            self.capacity.checked_mul(2).ok_or(Error::CapacityOverflow)
        }
    }

    /// Ensures room for at least `capacity` elements in total.
    ///
    /// Allocates exactly `capacity` when growing. A request at or below the
    /// current capacity changes nothing.
    pub fn reserve_exact(&mut self, capacity: usize) -> Result<()> {
        if capacity <= self.capacity {
            return Ok(());
        }
        self.relocate(capacity)
    }

    /// Ensures room for one more element using the doubling policy.
    pub fn reserve_amortized(&mut self) -> Result<()> {
        if self.len < self.capacity {
            return Ok(());
        }
        let capacity = self.next_capacity()?;
        self.relocate(capacity)
    }

    /// Ensures room for `additional` more elements.
    ///
    /// Grows to the larger of what is needed and the next doubling step, so
    /// repeated small requests stay amortized O(1).
    pub fn reserve_for(&mut self, additional: usize) -> Result<()> {
        let wanted = self
            .len
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow)?;
        if wanted <= self.capacity {
            return Ok(());
        }
        let capacity = wanted.max(self.next_capacity()?);
        self.relocate(capacity)
    }

    /// Reduces capacity to `len`. A length of zero releases the block.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if self.capacity == self.len {
            return Ok(());
        }
        debug!("shrinking buffer from {} to {} slots", self.capacity, self.len);
        if self.len == 0 {
            // Safety: block came from allocate_array(capacity) and holds no values
            unsafe { self.alloc.deallocate_array(self.ptr, self.capacity) };
            self.ptr = NonNull::dangling();
            self.capacity = 0;
            return Ok(());
        }
        self.relocate(self.len)
    }

    /// Moves the live elements into a new block of `capacity` slots.
    fn relocate(&mut self, capacity: usize) -> Result<()> {
        debug_assert!(capacity >= self.len);
        let ptr = self.alloc.allocate_array::<T>(capacity)?;
        trace!("relocating buffer: {} -> {} slots", self.capacity, capacity);
        // Safety: distinct blocks, both sized for at least len elements
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), ptr.as_ptr(), self.len);
            self.alloc.deallocate_array(self.ptr, self.capacity);
        }
        self.ptr = ptr;
        self.capacity = capacity;
        self.check();
        Ok(())
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Builds an element with `make` and places it at `index`, shifting
    /// `[index, len)` one slot toward the tail.
    ///
    /// Grows with the doubling policy when full. If `make` panics or the
    /// allocator fails, the buffer is left exactly as it was.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn emplace_with(&mut self, index: usize, make: impl FnOnce() -> T) -> Result<&mut T> {
        assert!(index <= self.len, "insertion index {index} past length {}", self.len);
        if self.len == self.capacity {
            self.grow_emplace(index, make)?;
        } else {
            self.shift_emplace(index, make);
        }
        // Safety: index < len after insertion
        Ok(unsafe { &mut *self.ptr.as_ptr().add(index) })
    }

    fn shift_emplace(&mut self, index: usize, make: impl FnOnce() -> T) {
        // Run user code before touching the layout.
        let value = make();
        // Safety: len < capacity, so [index, len] fits after the shift
        unsafe {
            let slot = self.ptr.as_ptr().add(index);
            ptr::copy(slot, slot.add(1), self.len - index);
            self.alloc.construct(NonNull::new_unchecked(slot), value);
        }
        self.len += 1;
    }

    fn grow_emplace(&mut self, index: usize, make: impl FnOnce() -> T) -> Result<()> {
        let capacity = self.next_capacity()?;
        let mut guard = BlockGuard::<T, A>::allocate(&mut self.alloc, capacity)?;
        // Safety: index <= len < capacity; the guard frees the block if make unwinds
        unsafe {
            let slot = NonNull::new_unchecked(guard.ptr.as_ptr().add(index));
            let value = make();
            guard.alloc.construct(slot, value);
        }
        let fresh = guard.finish();
        trace!(
            "relocating buffer: {} -> {} slots (insert at {index})",
            self.capacity, capacity
        );
        // Safety: disjoint blocks; prefix and suffix land on either side of index
        unsafe {
            let old = self.ptr.as_ptr();
            ptr::copy_nonoverlapping(old, fresh.as_ptr(), index);
            ptr::copy_nonoverlapping(
                old.add(index),
                fresh.as_ptr().add(index + 1),
                self.len - index,
            );
            self.alloc.deallocate_array(self.ptr, self.capacity);
        }
        self.ptr = fresh;
        self.capacity = capacity;
        self.len += 1;
        self.check();
        Ok(())
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes and returns the last element.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // Safety: slot len was initialized and is now outside the live prefix
        Some(unsafe { ptr::read(self.ptr.as_ptr().add(self.len)) })
    }

    /// Removes the element at `index` and closes the gap.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "removal index {index} out of range for length {}", self.len);
        // Safety: index < len; the tail shifts over the vacated slot
        unsafe {
            let slot = self.ptr.as_ptr().add(index);
            let value = ptr::read(slot);
            ptr::copy(slot.add(1), slot, self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Destroys `[first, last)` and shifts the tail down over it.
    ///
    /// A range ending at `len` is a truncation and skips the shift.
    ///
    /// # Panics
    ///
    /// Panics unless `first <= last <= len`.
    pub fn erase(&mut self, first: usize, last: usize) {
        assert!(
            first <= last && last <= self.len,
            "erase range {first}..{last} invalid for length {}",
            self.len
        );
        if last == self.len {
            self.truncate(first);
            return;
        }
        let tail = self.len - last;
        // A panicking destructor leaks the tail instead of double-dropping it.
        self.len = first;
        // Safety: [first, last) initialized; tail [last, old_len) moves to first
        unsafe {
            let base = self.ptr.as_ptr();
            let doomed = ptr::slice_from_raw_parts_mut(base.add(first), last - first);
            self.alloc.destroy(NonNull::new_unchecked(doomed));
            ptr::copy(base.add(last), base.add(first), tail);
        }
        self.len = first + tail;
    }

    /// Destroys every element at or beyond `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let count = self.len - len;
        self.len = len;
        // Safety: [len, len + count) was initialized and is no longer reachable
        unsafe {
            let doomed = ptr::slice_from_raw_parts_mut(self.ptr.as_ptr().add(len), count);
            self.alloc.destroy(NonNull::new_unchecked(doomed));
        }
    }

    /// Destroys every element. Capacity is unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Deep copy with the same capacity.
    ///
    /// If a clone panics the partial copy is destroyed and its block freed.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
        A: Clone,
    {
        let mut alloc = self.alloc.clone();
        let mut guard = BlockGuard::<T, A>::allocate(&mut alloc, self.capacity)?;
        for value in self.as_slice() {
            guard.push(value.clone());
        }
        let ptr = guard.finish();
        Ok(Self {
            ptr,
            capacity: self.capacity,
            len: self.len,
            alloc,
            _marker: PhantomData,
        })
    }

    /// Asserts `len <= capacity` in debug builds or with `check-invariants`.
    #[inline]
    pub(crate) fn check(&self) {
        invariant!(
            self.len <= self.capacity,
            "buffer length {} exceeds capacity {}",
            self.len,
            self.capacity
        );
    }
}

impl<T, A: Allocator> Drop for StorageBuffer<T, A> {
    fn drop(&mut self) {
        // Safety: [0, len) initialized; the block came from allocate_array(capacity)
        unsafe {
            let live = ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
            self.len = 0;
            self.alloc.destroy(NonNull::new_unchecked(live));
            self.alloc.deallocate_array(self.ptr, self.capacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::testing::Tracking;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    fn buffer_of(values: &[u32]) -> StorageBuffer<u32, Tracking> {
        let mut buf = StorageBuffer::new_in(Tracking::new());
        for &v in values {
            let len = buf.len();
            buf.emplace_with(len, || v).unwrap();
        }
        buf
    }

    #[test]
    fn new_owns_no_block() {
        let alloc = Tracking::new();
        let buf: StorageBuffer<u64, _> = StorageBuffer::new_in(alloc.clone());
        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.len(), 0);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn doubling_growth() {
        let mut buf = StorageBuffer::new_in(Global);
        let mut seen = Vec::new();
        for i in 0..9u32 {
            buf.emplace_with(i as usize, || i).unwrap();
            seen.push(buf.capacity());
        }
        assert_eq!(seen, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
    }

    #[test]
    fn emplace_in_middle_without_growth() {
        let mut buf = buffer_of(&[1, 2, 4]);
        assert_eq!(buf.capacity(), 4);
        assert_eq!(*buf.emplace_with(2, || 3).unwrap(), 3);
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn emplace_in_middle_with_growth() {
        let mut buf = buffer_of(&[1, 2, 3, 4]);
        buf.emplace_with(1, || 9).unwrap();
        assert_eq!(buf.as_slice(), &[1, 9, 2, 3, 4]);
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn emplace_front_with_growth() {
        let mut buf = buffer_of(&[1, 2]);
        buf.emplace_with(0, || 0).unwrap();
        assert_eq!(buf.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn reserve_below_capacity_keeps_block() {
        let mut buf = buffer_of(&[1, 2, 3]);
        let before = buf.as_ptr();
        buf.reserve_exact(2).unwrap();
        buf.reserve_exact(4).unwrap();
        assert_eq!(buf.as_ptr(), before);
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn reserve_allocates_exactly() {
        let mut buf = buffer_of(&[1, 2, 3]);
        buf.reserve_exact(13).unwrap();
        assert_eq!(buf.capacity(), 13);
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn reserve_for_grows_by_at_least_doubling() {
        let mut buf: StorageBuffer<u8> = StorageBuffer::new_in(Global);
        buf.reserve_for(3).unwrap();
        assert_eq!(buf.capacity(), 3);
        for i in 0..3 {
            buf.emplace_with(i, || i as u8).unwrap();
        }
        buf.reserve_for(1).unwrap();
        assert_eq!(buf.capacity(), 6);
        buf.reserve_for(3).unwrap();
        assert_eq!(buf.capacity(), 6);
        buf.reserve_for(10).unwrap();
        assert_eq!(buf.capacity(), 13);
        assert_eq!(buf.as_slice(), [0, 1, 2]);
    }

    #[test]
    fn reserve_amortized_doubles_when_full() {
        let mut buf = buffer_of(&[1, 2]);
        buf.reserve_amortized().unwrap();
        assert_eq!(buf.capacity(), 4);
        buf.reserve_amortized().unwrap();
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn shrink_to_zero_frees_block() {
        let alloc = Tracking::new();
        let mut buf: StorageBuffer<u32, _> = StorageBuffer::with_capacity_in(8, alloc.clone()).unwrap();
        assert_eq!(alloc.live(), 1);
        buf.shrink_to_fit().unwrap();
        assert_eq!(buf.capacity(), 0);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn shrink_keeps_elements() {
        let mut buf = buffer_of(&[1, 2, 3, 4, 5]);
        assert_eq!(buf.capacity(), 8);
        buf.shrink_to_fit().unwrap();
        assert_eq!(buf.capacity(), 5);
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn erase_middle_range() {
        let mut buf = buffer_of(&[0, 1, 2, 3, 4, 5]);
        buf.erase(1, 3);
        assert_eq!(buf.as_slice(), &[0, 3, 4, 5]);
    }

    #[test]
    fn erase_to_end_truncates() {
        let mut buf = buffer_of(&[0, 1, 2, 3]);
        buf.erase(2, 4);
        assert_eq!(buf.as_slice(), &[0, 1]);
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn erase_drops_exactly_the_range() {
        let marker = Rc::new(());
        let mut buf = StorageBuffer::new_in(Global);
        for i in 0..5 {
            buf.emplace_with(i, || Rc::clone(&marker)).unwrap();
        }
        buf.erase(1, 4);
        assert_eq!(Rc::strong_count(&marker), 3);
        drop(buf);
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn remove_and_pop() {
        let mut buf = buffer_of(&[1, 2, 3]);
        assert_eq!(buf.remove(0), 1);
        assert_eq!(buf.pop(), Some(3));
        assert_eq!(buf.as_slice(), &[2]);
        assert_eq!(buf.pop(), Some(2));
        assert_eq!(buf.pop(), None);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buf = buffer_of(&[1, 2, 3]);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn clone_keeps_capacity() {
        let buf = buffer_of(&[1, 2, 3]);
        let copy = buf.try_clone().unwrap();
        assert_eq!(copy.as_slice(), &[1, 2, 3]);
        assert_eq!(copy.capacity(), 4);
        assert_ne!(copy.as_ptr(), buf.as_ptr());
    }

    #[test]
    fn build_in_capacity_is_len() {
        let buf = StorageBuffer::build_in(3, Global, |i| i * 10).unwrap();
        assert_eq!(buf.as_slice(), &[0, 10, 20]);
        assert_eq!(buf.capacity(), 3);
    }

    #[test]
    fn build_in_panic_releases_prefix() {
        let alloc = Tracking::new();
        let marker = Rc::new(());
        let result = catch_unwind(AssertUnwindSafe(|| {
            StorageBuffer::build_in(4, alloc.clone(), |i| {
                if i == 2 {
                    panic!("boom");
                }
                Rc::clone(&marker)
            })
        }));
        assert!(result.is_err());
        assert_eq!(Rc::strong_count(&marker), 1);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn panicking_constructor_during_growth_leaves_buffer_intact() {
        let alloc = Tracking::new();
        let mut buf = StorageBuffer::new_in(alloc.clone());
        for i in 0..4u32 {
            buf.emplace_with(i as usize, || i).unwrap();
        }
        let before = buf.as_ptr();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = buf.emplace_with(1, || panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(buf.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.as_ptr(), before);
        assert_eq!(alloc.live(), 1);
    }

    #[test]
    fn failed_growth_leaves_buffer_intact() {
        let alloc = Tracking::new();
        let mut buf = StorageBuffer::new_in(alloc.clone());
        buf.emplace_with(0, || 1u32).unwrap();
        alloc.set_budget(Some(0));
        let mut called = false;
        let err = buf
            .emplace_with(1, || {
                called = true;
                2
            })
            .unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { .. }));
        assert!(!called);
        assert_eq!(buf.as_slice(), &[1]);
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn zero_sized_elements() {
        let mut buf = StorageBuffer::new_in(Tracking::new());
        for i in 0..10 {
            buf.emplace_with(i, || ()).unwrap();
        }
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.allocator().allocations(), 0);
    }

    #[test]
    fn drop_frees_block() {
        let alloc = Tracking::new();
        {
            let mut buf = StorageBuffer::new_in(alloc.clone());
            for i in 0..20u64 {
                buf.emplace_with(0, || i).unwrap();
            }
        }
        assert_eq!(alloc.live(), 0);
    }
}
