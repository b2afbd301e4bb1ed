//! Allocation abstraction for the containers.
//!
//! Both containers manage memory through the four steps of an [`Allocator`]:
//!
//! ```text
//! allocate   - reserve raw, uninitialized memory for a layout
//! construct  - move a value into reserved memory
//! destroy    - run a value's destructor in place
//! deallocate - return the memory
//! ```
//!
//! [`DynamicArray`](crate::DynamicArray) allocates one block per capacity
//! step. [`LinkedList`](crate::LinkedList) allocates one block per node plus
//! one for its sentinel.
//!
//! [`Global`] forwards to `std::alloc` and is the default everywhere.

use core::alloc::Layout;
use core::mem;
use core::ptr::{self, NonNull};

use crate::{Error, Result};

/// Four-step memory management used by the containers.
///
/// Only [`allocate`](Allocator::allocate) and
/// [`deallocate`](Allocator::deallocate) are required. `construct` and
/// `destroy` default to a plain write and `drop_in_place`.
///
/// Blocks are handed between containers by `splice`, `merge` and `swap`, so
/// every instance of an allocator type must be able to free blocks obtained
/// from any other instance of that type.
///
/// # Example
///
/// ```
/// use std::alloc::Layout;
/// use std::ptr::NonNull;
/// use nexus_seq::{Allocator, DynamicArray, Error, Global};
///
/// /// Refuses anything larger than a page.
/// #[derive(Default)]
/// struct Small;
///
/// impl Allocator for Small {
///     fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
///         if layout.size() > 4096 {
///             return Err(Error::OutOfMemory { size: layout.size(), align: layout.align() });
///         }
///         Global.allocate(layout)
///     }
///
///     unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
///         unsafe { Global.deallocate(ptr, layout) }
///     }
/// }
///
/// let mut array: DynamicArray<u64, Small> = DynamicArray::new_in(Small);
/// assert!(array.try_reserve(16).is_ok());
/// assert!(array.try_reserve(1 << 20).is_err());
/// ```
pub trait Allocator {
    /// Allocates a block for `layout`.
    ///
    /// `layout.size()` is never zero when called by this crate.
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>>;

    /// Returns a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` with the same `layout`
    /// and not deallocated since.
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout);

    /// Moves `value` into uninitialized memory.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes and properly aligned. Any value
    /// already there is overwritten without being dropped.
    #[inline]
    unsafe fn construct<T>(&mut self, ptr: NonNull<T>, value: T) {
        unsafe { ptr.as_ptr().write(value) }
    }

    /// Runs the destructor of the value at `ptr` in place.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an initialized value that is not used again.
    #[inline]
    unsafe fn destroy<T: ?Sized>(&mut self, ptr: NonNull<T>) {
        unsafe { ptr::drop_in_place(ptr.as_ptr()) }
    }

    /// Allocates uninitialized room for `n` values of `T`.
    ///
    /// Zero-sized requests return a dangling, aligned pointer without
    /// touching the allocator.
    #[inline]
    fn allocate_array<T>(&mut self, n: usize) -> Result<NonNull<T>> {
        let layout = Layout::array::<T>(n).map_err(|_| Error::CapacityOverflow)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        self.allocate(layout).map(NonNull::cast)
    }

    /// Frees a block obtained from [`allocate_array`](Allocator::allocate_array).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_array::<T>(n)` on an allocator of this
    /// type, with the same `n`, and must not have been freed already.
    #[inline]
    unsafe fn deallocate_array<T>(&mut self, ptr: NonNull<T>, n: usize) {
        if let Ok(layout) = Layout::array::<T>(n) {
            if layout.size() != 0 {
                unsafe { self.deallocate(ptr.cast(), layout) }
            }
        }
    }
}

/// The global allocator (`std::alloc`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Global;

impl Allocator for Global {
    #[inline]
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>> {
        debug_assert!(layout.size() != 0, "zero-sized allocation");
        // Safety: layout has non-zero size
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(Error::out_of_memory(layout))
    }

    #[inline]
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

// =============================================================================
// Block guard
// =============================================================================

/// A freshly allocated block whose first `initialized` slots hold values.
///
/// Dropping the guard destroys those values and frees the block. Relocation
/// and copy paths build into a guarded block and only `finish` it once
/// nothing left can unwind, so a panicking constructor never leaks and
/// never disturbs the container's current storage.
pub(crate) struct BlockGuard<'a, T, A: Allocator> {
    pub(crate) alloc: &'a mut A,
    pub(crate) ptr: NonNull<T>,
    pub(crate) capacity: usize,
    pub(crate) initialized: usize,
}

impl<'a, T, A: Allocator> BlockGuard<'a, T, A> {
    /// Allocates a guarded block of `capacity` slots.
    #[inline]
    pub(crate) fn allocate(alloc: &'a mut A, capacity: usize) -> Result<Self> {
        let ptr = alloc.allocate_array::<T>(capacity)?;
        Ok(Self {
            alloc,
            ptr,
            capacity,
            initialized: 0,
        })
    }

    /// Constructs the next slot in order.
    #[inline]
    pub(crate) fn push(&mut self, value: T) {
        debug_assert!(self.initialized < self.capacity);
        // Safety: slot is inside the block and still uninitialized
        unsafe {
            let slot = NonNull::new_unchecked(self.ptr.as_ptr().add(self.initialized));
            self.alloc.construct(slot, value);
        }
        self.initialized += 1;
    }

    /// Releases the block to the caller without destroying anything.
    #[inline]
    pub(crate) fn finish(self) -> NonNull<T> {
        let ptr = self.ptr;
        mem::forget(self);
        ptr
    }
}

impl<T, A: Allocator> Drop for BlockGuard<'_, T, A> {
    fn drop(&mut self) {
        // Safety: the first `initialized` slots were constructed by `push`
        // (or by the owner, which keeps the count accurate)
        unsafe {
            let built = ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.initialized);
            self.alloc.destroy(NonNull::new_unchecked(built));
            self.alloc.deallocate_array(self.ptr, self.capacity);
        }
    }
}

// =============================================================================
// Test allocator
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Stats {
        live: Cell<isize>,
        allocations: Cell<usize>,
        destroys: Cell<usize>,
        budget: Cell<Option<usize>>,
    }

    /// Counts live blocks; refuses requests once its budget is spent.
    ///
    /// Clones share counters, so blocks may move between containers.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct Tracking {
        stats: Rc<Stats>,
    }

    impl Tracking {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Blocks currently allocated and not yet freed.
        pub(crate) fn live(&self) -> isize {
            self.stats.live.get()
        }

        pub(crate) fn allocations(&self) -> usize {
            self.stats.allocations.get()
        }

        /// Calls to `destroy`, whatever their length.
        pub(crate) fn destroys(&self) -> usize {
            self.stats.destroys.get()
        }

        /// Allows `n` more allocations (`None` = unlimited).
        pub(crate) fn set_budget(&self, n: Option<usize>) {
            self.stats.budget.set(n);
        }
    }

    impl Allocator for Tracking {
        fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>> {
            if let Some(left) = self.stats.budget.get() {
                if left == 0 {
                    return Err(Error::out_of_memory(layout));
                }
                self.stats.budget.set(Some(left - 1));
            }
            let ptr = Global.allocate(layout)?;
            self.stats.live.set(self.stats.live.get() + 1);
            self.stats.allocations.set(self.stats.allocations.get() + 1);
            Ok(ptr)
        }

        unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
            self.stats.live.set(self.stats.live.get() - 1);
            unsafe { Global.deallocate(ptr, layout) }
        }

        unsafe fn destroy<T: ?Sized>(&mut self, ptr: NonNull<T>) {
            self.stats.destroys.set(self.stats.destroys.get() + 1);
            unsafe { ptr::drop_in_place(ptr.as_ptr()) }
        }
    }
}
