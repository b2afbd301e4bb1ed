//! Sequence containers with explicit allocation and position contracts.
//!
//! Two containers, each with its own memory layout and its own rules for
//! which positions survive which operations:
//!
//! ```text
//! DynamicArray<T>  - one contiguous block, doubling growth, index positions
//! LinkedList<T>    - one node per element around a sentinel, node positions
//! ```
//!
//! Both allocate through an [`Allocator`] (default [`Global`]), report
//! allocation failure from their `try_*` methods, and leave themselves
//! untouched when an allocation or an element constructor fails.
//!
//! # Quick Start
//!
//! ```
//! use nexus_seq::{DynamicArray, LinkedList};
//!
//! let mut array = DynamicArray::new();
//! array.push_back(1);
//! array.push_back(2);
//! assert_eq!(array.at(1), Ok(&2));
//! assert!(array.at(2).is_err());
//!
//! let mut list = LinkedList::from([1, 3]);
//! let three = list.next(list.begin());
//! list.insert(three, 2);
//! assert_eq!(list, [1, 2, 3]);
//! ```
//!
//! # Containers
//!
//! | Structure | Use Case | Key Operations |
//! |-----------|----------|----------------|
//! | [`DynamicArray`] | Dense storage, random access | amortized O(1) push, O(1) index |
//! | [`LinkedList`] | Stable positions, rearranging | O(1) insert/erase/splice at a position |
//! | [`Queue`] | FIFO over either of the above | O(1) push/pop over a list |
//!
//! # Positions
//!
//! | Position | Kind | Survives |
//! |----------|------|----------|
//! | [`ArrayPos`] | index | nothing that grows, shifts or shrinks storage |
//! | [`ListPos`] | node | everything except erasing its own node |
//!
//! A [`ListPos`] does not borrow its list. Handing a list a position it does
//! not hold is undefined behavior (see the list's position invariant); debug
//! builds detect it on every mutating call and panic.
//!
//! # Features
//!
//! - `check-invariants`: run the full ring and buffer consistency checks in
//!   release builds too. They always run in debug builds. Also checks list
//!   membership of positions passed to `next`, `prev` and `get`.
//!
//! # Logging
//!
//! Block relocations are reported at `trace` level and shrinks and sorts at
//! `debug` level through the [`log`] facade. The crate installs no logger.

#![warn(missing_docs)]

/// Asserts a structural invariant in debug builds or with the
/// `check-invariants` feature.
macro_rules! invariant {
    ($cond:expr, $($arg:tt)+) => {
        if cfg!(any(debug_assertions, feature = "check-invariants")) {
            assert!($cond, $($arg)+);
        }
    };
}

pub mod alloc;
pub mod array;
pub mod buffer;
pub mod error;
pub mod list;
pub mod pos;
pub mod queue;
mod ring;

pub use alloc::{Allocator, Global};
pub use array::DynamicArray;
pub use buffer::StorageBuffer;
pub use error::{Error, Result};
pub use list::LinkedList;
pub use pos::{ArrayPos, ListPos};
pub use queue::{Queue, Sequence};
