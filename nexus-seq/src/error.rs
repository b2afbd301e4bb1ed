//! Error types for container operations.

use core::alloc::Layout;
use core::fmt;
use std::alloc::handle_alloc_error;

/// Error returned by checked access and fallible allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Checked access past the end of the sequence.
    OutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the sequence at the time of the access.
        len: usize,
    },
    /// The allocator could not satisfy a request.
    OutOfMemory {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment in bytes.
        align: usize,
    },
    /// The requested capacity cannot be described by a memory layout.
    CapacityOverflow,
}

impl Error {
    #[inline]
    pub(crate) fn out_of_memory(layout: Layout) -> Self {
        Error::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Error::OutOfMemory { size, align } => {
                write!(f, "allocation of {size} bytes (align {align}) failed")
            }
            Error::CapacityOverflow => write!(f, "capacity overflow"),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Unwraps the result of an allocating operation on an infallible path.
///
/// Allocation failure goes to [`handle_alloc_error`], the same way the
/// standard collections report it. Capacity overflow panics.
#[inline]
pub(crate) fn infallible<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(Error::OutOfMemory { size, align }) => {
            match Layout::from_size_align(size, align) {
                Ok(layout) => handle_alloc_error(layout),
                Err(_) => panic!("capacity overflow"),
            }
        }
        Err(err) => panic!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_out_of_range() {
        let err = Error::OutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "index 7 out of range for length 3");
    }

    #[test]
    fn display_out_of_memory() {
        let err = Error::out_of_memory(Layout::new::<u64>());
        assert_eq!(err.to_string(), "allocation of 8 bytes (align 8) failed");
    }

    #[test]
    fn infallible_passes_values_through() {
        assert_eq!(infallible(Ok(5)), 5);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn infallible_panics_on_overflow() {
        let _: () = infallible(Err(Error::CapacityOverflow));
    }
}
