//! Position types for the two containers.
//!
//! | Position     | Container                          | Moves by                   | Invalidated by                      |
//! |--------------|------------------------------------|----------------------------|-------------------------------------|
//! | [`ArrayPos`] | [`DynamicArray`](crate::DynamicArray) | `+`/`-` any offset, O(1) | any growth, shift or shrink         |
//! | [`ListPos`]  | [`LinkedList`](crate::LinkedList)  | `list.next`/`list.prev`    | erasing the node it names           |
//!
//! An `ArrayPos` is a plain index, so a stale one is never unsafe; it just
//! addresses whatever now sits at that index (or falls out of range). A
//! `ListPos` names a node, and keeps naming it while the node is spliced or
//! merged into another list.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Sub, SubAssign};
use core::ptr::NonNull;

use crate::ring::Link;

// =============================================================================
// ArrayPos
// =============================================================================

/// Random-access position in a [`DynamicArray`](crate::DynamicArray).
///
/// Arithmetic wraps, so stepping before `begin()` yields a position past
/// every valid index. Operations given such a position treat it as out of
/// range.
///
/// ```
/// use nexus_seq::DynamicArray;
///
/// let array = DynamicArray::from([10, 20, 30, 40]);
/// let mut pos = array.begin() + 1;
/// assert_eq!(array.get_at(pos), Some(&20));
/// pos += 2;
/// assert_eq!(array.get_at(pos), Some(&40));
/// assert_eq!(array.end() - pos, 1);
/// assert_eq!(array.get_at(array.begin() - 1), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrayPos(usize);

impl ArrayPos {
    /// Position of element `index`.
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The index this position refers to.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Position `n` slots away.
    #[inline]
    pub const fn offset(self, n: isize) -> Self {
        Self(self.0.wrapping_add_signed(n))
    }

    /// Signed number of slots from `origin` to `self`.
    #[inline]
    pub const fn distance(self, origin: Self) -> isize {
        self.0.wrapping_sub(origin.0) as isize
    }

    /// The following position.
    #[inline]
    pub const fn next(self) -> Self {
        self.offset(1)
    }

    /// The preceding position.
    #[inline]
    pub const fn prev(self) -> Self {
        self.offset(-1)
    }
}

impl Add<isize> for ArrayPos {
    type Output = Self;

    #[inline]
    fn add(self, n: isize) -> Self {
        self.offset(n)
    }
}

impl Sub<isize> for ArrayPos {
    type Output = Self;

    #[inline]
    fn sub(self, n: isize) -> Self {
        self.offset(n.wrapping_neg())
    }
}

impl AddAssign<isize> for ArrayPos {
    #[inline]
    fn add_assign(&mut self, n: isize) {
        *self = *self + n;
    }
}

impl SubAssign<isize> for ArrayPos {
    #[inline]
    fn sub_assign(&mut self, n: isize) {
        *self = *self - n;
    }
}

impl Sub for ArrayPos {
    type Output = isize;

    #[inline]
    fn sub(self, origin: Self) -> isize {
        self.distance(origin)
    }
}

// =============================================================================
// ListPos
// =============================================================================

/// Bidirectional position in a [`LinkedList`](crate::LinkedList).
///
/// Names a node (or the list's end marker). Equality is node identity.
/// Advance it with [`LinkedList::next`](crate::LinkedList::next) and
/// [`LinkedList::prev`](crate::LinkedList::prev).
///
/// A `ListPos` does not borrow its list. It must only be handed back to the
/// list that currently holds its node, and only while that node is alive;
/// see the list's position invariant.
pub struct ListPos<T> {
    pub(crate) link: NonNull<Link>,
    _marker: PhantomData<*const T>,
}

impl<T> ListPos<T> {
    #[inline]
    pub(crate) const fn new(link: NonNull<Link>) -> Self {
        Self {
            link,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for ListPos<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ListPos<T> {}

impl<T> PartialEq for ListPos<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl<T> Eq for ListPos<T> {}

impl<T> Hash for ListPos<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.hash(state);
    }
}

impl<T> fmt::Debug for ListPos<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListPos").field(&self.link).finish()
    }
}
