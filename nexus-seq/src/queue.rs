//! FIFO queue over any [`Sequence`].
//!
//! [`Queue`] adds no algorithms of its own. It pushes at the back of its
//! container and pops from the front, and works with any type implementing
//! [`Sequence`]. [`LinkedList`] is the default container; [`DynamicArray`]
//! works too, with O(n) pops.
//!
//! # When to use which container
//!
//! | Container        | `push`          | `pop`  | Memory                     |
//! |------------------|-----------------|--------|----------------------------|
//! | `LinkedList<T>`  | O(1)            | O(1)   | one allocation per element |
//! | `DynamicArray<T>`| amortized O(1)  | O(n)   | one contiguous block       |
//!
//! # Example
//!
//! ```
//! use nexus_seq::{DynamicArray, Queue};
//!
//! let mut jobs = Queue::new();
//! jobs.push("parse");
//! jobs.push("check");
//! assert_eq!(jobs.front(), Some(&"parse"));
//! assert_eq!(jobs.pop(), Some("parse"));
//! assert_eq!(jobs.len(), 1);
//!
//! // Same contract over a contiguous container
//! let mut small: Queue<u8, DynamicArray<u8>> = Queue::from_container(DynamicArray::from([1, 2]));
//! small.push(3);
//! assert_eq!(small.pop(), Some(1));
//! ```

use core::fmt;
use core::marker::PhantomData;
use core::mem;

use crate::alloc::Allocator;
use crate::{DynamicArray, LinkedList};

/// Container operations a [`Queue`] relies on.
pub trait Sequence {
    /// Element type.
    type Item;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First element.
    fn front(&self) -> Option<&Self::Item>;

    /// Last element.
    fn back(&self) -> Option<&Self::Item>;

    /// Appends an element.
    fn push_back(&mut self, value: Self::Item);

    /// Removes and returns the first element.
    fn pop_front(&mut self) -> Option<Self::Item>;

    /// Appends the element built by `make` and returns it.
    fn emplace_back_with<F: FnOnce() -> Self::Item>(&mut self, make: F) -> &mut Self::Item;
}

impl<T, A: Allocator> Sequence for LinkedList<T, A> {
    type Item = T;

    #[inline]
    fn len(&self) -> usize {
        LinkedList::len(self)
    }

    #[inline]
    fn front(&self) -> Option<&T> {
        LinkedList::front(self)
    }

    #[inline]
    fn back(&self) -> Option<&T> {
        LinkedList::back(self)
    }

    #[inline]
    fn push_back(&mut self, value: T) {
        LinkedList::push_back(self, value);
    }

    #[inline]
    fn pop_front(&mut self) -> Option<T> {
        LinkedList::pop_front(self)
    }

    #[inline]
    fn emplace_back_with<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        LinkedList::emplace_back_with(self, make)
    }
}

impl<T, A: Allocator> Sequence for DynamicArray<T, A> {
    type Item = T;

    #[inline]
    fn len(&self) -> usize {
        DynamicArray::len(self)
    }

    #[inline]
    fn front(&self) -> Option<&T> {
        DynamicArray::front(self)
    }

    #[inline]
    fn back(&self) -> Option<&T> {
        DynamicArray::back(self)
    }

    #[inline]
    fn push_back(&mut self, value: T) {
        DynamicArray::push_back(self, value);
    }

    /// O(n): the remaining elements shift down.
    #[inline]
    fn pop_front(&mut self) -> Option<T> {
        let begin = self.begin();
        self.remove(begin)
    }

    #[inline]
    fn emplace_back_with<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        DynamicArray::emplace_back_with(self, make)
    }
}

/// First-in, first-out queue over a [`Sequence`].
pub struct Queue<T, C: Sequence<Item = T> = LinkedList<T>> {
    container: C,
    _marker: PhantomData<T>,
}

impl<T> Queue<T> {
    /// Creates an empty queue over a [`LinkedList`].
    #[inline]
    pub fn new() -> Self {
        Self::from_container(LinkedList::new())
    }
}

impl<T, C: Sequence<Item = T>> Queue<T, C> {
    /// Wraps an existing container. Its front is the head of the queue.
    #[inline]
    pub const fn from_container(container: C) -> Self {
        Self {
            container,
            _marker: PhantomData,
        }
    }

    /// Unwraps the container.
    #[inline]
    pub fn into_inner(self) -> C {
        self.container
    }

    /// Number of queued elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.container.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    /// The oldest element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.container.front()
    }

    /// The newest element.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.container.back()
    }

    /// Adds `value` at the tail.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.container.push_back(value);
    }

    /// Adds the value built by `make` at the tail and returns it.
    #[inline]
    pub fn emplace_with(&mut self, make: impl FnOnce() -> T) -> &mut T {
        self.container.emplace_back_with(make)
    }

    /// Removes and returns the oldest element.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.container.pop_front()
    }

    /// Exchanges contents with `other`.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.container, &mut other.container);
    }

    /// Moves the contents out, leaving this queue empty.
    #[inline]
    pub fn take(&mut self) -> Self
    where
        C: Default,
    {
        Self::from_container(mem::take(&mut self.container))
    }
}

impl<T, const N: usize> From<[T; N]> for Queue<T> {
    /// The first array element is the head of the queue.
    fn from(values: [T; N]) -> Self {
        Self::from_container(LinkedList::from(values))
    }
}

impl<T, C: Sequence<Item = T> + Default> Default for Queue<T, C> {
    fn default() -> Self {
        Self::from_container(C::default())
    }
}

impl<T, C: Sequence<Item = T> + Clone> Clone for Queue<T, C> {
    fn clone(&self) -> Self {
        Self::from_container(self.container.clone())
    }
}

impl<T, C: Sequence<Item = T> + fmt::Debug> fmt::Debug for Queue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue").field("container", &self.container).finish()
    }
}
