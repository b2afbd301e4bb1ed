//! Sentinel-anchored circular chain of nodes.
//!
//! ```text
//!           +-----------------------------------------+
//!           v                                         |
//!      +----------+     +------+     +------+     +------+
//!  +-->| sentinel |<--->|  n0  |<--->|  n1  |<--->|  n2  |
//!  |   +----------+     +------+     +------+     +------+
//!  |                                                  ^
//!  +--------------------------------------------------+
//! ```
//!
//! The sentinel carries no value. An empty ring is the sentinel linked to
//! itself. Every relink goes through [`hook`], which joins two links in both
//! directions; [`transfer`] is the one primitive behind every splice and
//! merge.
//!
//! The ring only manages links. Allocating and freeing nodes is the owner's
//! job, through its allocator.

use core::alloc::Layout;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::alloc::Allocator;
use crate::Result;

/// Previous/next pair shared by the sentinel and every node.
#[derive(Debug)]
pub(crate) struct Link {
    pub(crate) prev: NonNull<Link>,
    pub(crate) next: NonNull<Link>,
}

impl Link {
    /// A link not yet joined to anything.
    #[inline]
    pub(crate) const fn dangling() -> Self {
        Self {
            prev: NonNull::dangling(),
            next: NonNull::dangling(),
        }
    }
}

/// A node: its link first, so a node pointer and its link pointer coincide.
#[repr(C)]
pub(crate) struct Node<T> {
    #[allow(dead_code)] // reached through the cast node pointer
    link: Link,
    pub(crate) value: T,
}

impl<T> Node<T> {
    #[inline]
    pub(crate) const fn unlinked(value: T) -> Self {
        Self {
            link: Link::dangling(),
            value,
        }
    }

    /// The value of the node behind `link`.
    ///
    /// # Safety
    ///
    /// `link` must belong to a live `Node<T>` (never the sentinel), and the
    /// returned borrow must not outlive it.
    #[inline]
    pub(crate) unsafe fn value<'a>(link: NonNull<Link>) -> &'a T {
        unsafe { &(*link.cast::<Node<T>>().as_ptr()).value }
    }

    /// Mutable variant of [`Node::value`].
    ///
    /// # Safety
    ///
    /// As for `value`, and no other borrow of the node may exist.
    #[inline]
    pub(crate) unsafe fn value_mut<'a>(link: NonNull<Link>) -> &'a mut T {
        unsafe { &mut (*link.cast::<Node<T>>().as_ptr()).value }
    }
}

// =============================================================================
// Primitives
// =============================================================================

/// Joins `first -> second` and `first <- second`.
///
/// # Safety
///
/// Both links must be live.
#[inline]
pub(crate) unsafe fn hook(first: NonNull<Link>, second: NonNull<Link>) {
    unsafe {
        (*first.as_ptr()).next = second;
        (*second.as_ptr()).prev = first;
    }
}

/// # Safety
///
/// `link` must be live.
#[inline]
pub(crate) unsafe fn next(link: NonNull<Link>) -> NonNull<Link> {
    unsafe { (*link.as_ptr()).next }
}

/// # Safety
///
/// `link` must be live.
#[inline]
pub(crate) unsafe fn prev(link: NonNull<Link>) -> NonNull<Link> {
    unsafe { (*link.as_ptr()).prev }
}

/// Moves the half-open run `[first, last)` so that it sits before `pos`.
///
/// The run may come from the same ring as `pos` or from another one; the
/// source closes over the gap either way. No-op when the run is empty or
/// when `pos` is `first` or `last` (already in place).
///
/// ```text
/// before:  .. bf [first .. last_in] last ..      .. bp pos ..
/// after:   .. bf last ..      .. bp [first .. last_in] pos ..
/// ```
///
/// # Safety
///
/// All links live; `[first, last)` is a forward run that does not contain
/// `pos`.
pub(crate) unsafe fn transfer(pos: NonNull<Link>, first: NonNull<Link>, last: NonNull<Link>) {
    if first == last || pos == first || pos == last {
        return;
    }
    unsafe {
        let last_in = prev(last);
        let before_first = prev(first);
        let before_pos = prev(pos);
        hook(before_first, last);
        hook(before_pos, first);
        hook(last_in, pos);
    }
}

// =============================================================================
// NodeRing
// =============================================================================

/// Heap-allocated sentinel plus the count of nodes hooked to it.
pub(crate) struct NodeRing<T> {
    sentinel: NonNull<Link>,
    len: usize,
    _marker: PhantomData<Box<Node<T>>>,
}

impl<T> NodeRing<T> {
    /// Allocates a sentinel and closes it on itself.
    pub(crate) fn new_in<A: Allocator>(alloc: &mut A) -> Result<Self> {
        let sentinel = alloc.allocate(Layout::new::<Link>())?.cast::<Link>();
        // Safety: freshly allocated, sized and aligned for Link
        unsafe {
            alloc.construct(
                sentinel,
                Link {
                    prev: sentinel,
                    next: sentinel,
                },
            );
        }
        Ok(Self {
            sentinel,
            len: 0,
            _marker: PhantomData,
        })
    }

    /// Frees the sentinel.
    ///
    /// # Safety
    ///
    /// The ring must be empty, `alloc` must be compatible with the one
    /// given to `new_in`, and the ring must not be used afterwards.
    pub(crate) unsafe fn release<A: Allocator>(&mut self, alloc: &mut A) {
        debug_assert_eq!(self.len, 0, "releasing non-empty ring");
        unsafe { alloc.deallocate(self.sentinel.cast(), Layout::new::<Link>()) }
    }

    #[inline]
    pub(crate) const fn sentinel(&self) -> NonNull<Link> {
        self.sentinel
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// First node, or the sentinel when empty.
    #[inline]
    pub(crate) fn first(&self) -> NonNull<Link> {
        // Safety: the sentinel lives as long as the ring
        unsafe { next(self.sentinel) }
    }

    /// Last node, or the sentinel when empty.
    #[inline]
    pub(crate) fn last(&self) -> NonNull<Link> {
        // Safety: the sentinel lives as long as the ring
        unsafe { prev(self.sentinel) }
    }

    /// Hooks a detached node in before `pos`.
    ///
    /// # Safety
    ///
    /// `pos` is in this ring; `node` is live and in no ring.
    #[inline]
    pub(crate) unsafe fn link_before(&mut self, pos: NonNull<Link>, node: NonNull<Link>) {
        unsafe {
            hook(prev(pos), node);
            hook(node, pos);
        }
        self.len += 1;
        self.check_local(node);
    }

    /// Unhooks `node`, closing the ring over it.
    ///
    /// # Safety
    ///
    /// `node` is a node (not the sentinel) of this ring.
    #[inline]
    pub(crate) unsafe fn unlink(&mut self, node: NonNull<Link>) {
        debug_assert!(node != self.sentinel, "unlinking the sentinel");
        unsafe {
            let before = prev(node);
            let after = next(node);
            hook(before, after);
            self.check_local(after);
        }
        self.len -= 1;
    }

    /// Detaches the whole chain, leaving the ring empty.
    ///
    /// Returns the first detached node and how many follow it (inclusive).
    /// The caller owns those nodes from here on.
    pub(crate) fn reset(&mut self) -> (NonNull<Link>, usize) {
        let first = self.first();
        let count = self.len;
        // Safety: the sentinel is live
        unsafe { hook(self.sentinel, self.sentinel) };
        self.len = 0;
        (first, count)
    }

    // =========================================================================
    // Splicing
    // =========================================================================

    /// Moves every node of `other` before `pos`.
    ///
    /// # Safety
    ///
    /// `pos` is in this ring and `other` is a different ring.
    pub(crate) unsafe fn splice_all(&mut self, pos: NonNull<Link>, other: &mut NodeRing<T>) {
        if other.len == 0 {
            return;
        }
        unsafe { transfer(pos, other.first(), other.sentinel) };
        self.len += other.len;
        other.len = 0;
        self.check();
        other.check();
    }

    /// Moves the single node `node` of `other` before `pos`.
    ///
    /// # Safety
    ///
    /// `pos` is in this ring; `node` is a node of `other`, a different ring.
    pub(crate) unsafe fn splice_one(
        &mut self,
        pos: NonNull<Link>,
        other: &mut NodeRing<T>,
        node: NonNull<Link>,
    ) {
        unsafe { transfer(pos, node, next(node)) };
        self.len += 1;
        other.len -= 1;
        self.check_local(node);
    }

    /// Moves `[first, last)` of `other` before `pos`; returns how many moved.
    ///
    /// A run that would cross `other`'s sentinel (`last` before `first`, or
    /// `first` at the sentinel) moves nothing and returns 0.
    ///
    /// # Safety
    ///
    /// `pos` is in this ring; `first` and `last` are links of `other`, a
    /// different ring.
    pub(crate) unsafe fn splice_range(
        &mut self,
        pos: NonNull<Link>,
        other: &mut NodeRing<T>,
        first: NonNull<Link>,
        last: NonNull<Link>,
    ) -> usize {
        let mut count = 0;
        let mut cursor = first;
        while cursor != last {
            if cursor == other.sentinel {
                return 0;
            }
            count += 1;
            // Safety: cursor is a live node of other
            cursor = unsafe { next(cursor) };
        }
        if count == 0 {
            return 0;
        }
        unsafe { transfer(pos, first, last) };
        self.len += count;
        other.len -= count;
        self.check();
        other.check();
        count
    }

    /// Moves `node` before `pos` within this ring.
    ///
    /// # Safety
    ///
    /// Both are in this ring and `node` is not the sentinel.
    pub(crate) unsafe fn relocate(&mut self, pos: NonNull<Link>, node: NonNull<Link>) {
        unsafe { transfer(pos, node, next(node)) };
        self.check_local(node);
    }

    /// Exchanges the chains of two rings. Each keeps its own sentinel.
    pub(crate) fn swap_chains(&mut self, other: &mut NodeRing<T>) {
        match (self.len, other.len) {
            (0, 0) => return,
            // Safety: self != other (distinct &mut), sentinels live
            (_, 0) => unsafe { other.splice_all(other.sentinel, self) },
            (0, _) => unsafe { self.splice_all(self.sentinel, other) },
            _ => {
                let (mine_first, mine_last) = (self.first(), self.last());
                let (theirs_first, theirs_last) = (other.first(), other.last());
                // Safety: all four boundary nodes and both sentinels are live
                unsafe {
                    hook(self.sentinel, theirs_first);
                    hook(theirs_last, self.sentinel);
                    hook(other.sentinel, mine_first);
                    hook(mine_last, other.sentinel);
                }
                core::mem::swap(&mut self.len, &mut other.len);
            }
        }
        self.check();
        other.check();
    }

    /// Reverses the ring by exchanging the links of every node and the
    /// sentinel.
    pub(crate) fn reverse(&mut self) {
        let mut cursor = self.sentinel;
        loop {
            // Safety: every link reachable from the sentinel is live
            unsafe {
                let link = &mut *cursor.as_ptr();
                core::mem::swap(&mut link.prev, &mut link.next);
                // old next is now prev
                cursor = link.prev;
            }
            if cursor == self.sentinel {
                break;
            }
        }
        self.check();
    }

    /// Rebuilds the chain in the order given.
    ///
    /// # Safety
    ///
    /// `order` is a permutation of this ring's nodes.
    pub(crate) unsafe fn relink(&mut self, order: &[NonNull<Link>]) {
        invariant!(
            order.len() == self.len,
            "relink order has {} nodes, ring has {}",
            order.len(),
            self.len
        );
        let mut tail = self.sentinel;
        for &node in order {
            unsafe { hook(tail, node) };
            tail = node;
        }
        unsafe { hook(tail, self.sentinel) };
        self.check();
    }

    /// Returns `true` if `link` is the sentinel or one of this ring's nodes.
    ///
    /// Compares addresses only, so it is safe to ask about a stale link.
    pub(crate) fn contains(&self, link: NonNull<Link>) -> bool {
        let mut cursor = self.sentinel;
        loop {
            if cursor == link {
                return true;
            }
            // Safety: every link reachable from the sentinel is live
            cursor = unsafe { next(cursor) };
            if cursor == self.sentinel {
                return false;
            }
        }
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Full walk: both directions agree and the node count equals `len`.
    pub(crate) fn check(&self) {
        if !cfg!(any(debug_assertions, feature = "check-invariants")) {
            return;
        }
        let mut count = 0;
        let mut cursor = self.sentinel;
        loop {
            // Safety: every link reachable from the sentinel is live
            let (after, back) = unsafe { (next(cursor), prev(next(cursor))) };
            invariant!(
                back == cursor,
                "ring broken: next/prev disagree after {count} nodes"
            );
            if after == self.sentinel {
                break;
            }
            count += 1;
            invariant!(count <= self.len, "ring longer than its length {}", self.len);
            cursor = after;
        }
        invariant!(count == self.len, "ring has {count} nodes, length says {}", self.len);
    }

    /// Neighbourhood check around one link.
    #[inline]
    fn check_local(&self, link: NonNull<Link>) {
        // Safety: callers pass a link of this ring
        unsafe {
            invariant!(
                next(prev(link)) == link && prev(next(link)) == link,
                "ring broken around a relinked node"
            );
        }
    }
}
