//! Container-specific error types.

use std::error::Error;
use std::fmt;

use crate::list::ListId;

/// Errors from [`Array`](crate::Array) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// An index outside the valid range for the operation.
    OutOfRange {
        /// The offending index.
        index: u32,
        /// The array's logical length at the time of the call.
        len: u32,
    },
    /// The allocator could not provide the requested capacity.
    AllocationFailed {
        /// Requested total capacity, in elements.
        requested: usize,
    },
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for array of length {len}")
            }
            Self::AllocationFailed { requested } => {
                write!(f, "allocation of {requested} elements failed")
            }
        }
    }
}

impl Error for ArrayError {}

/// Errors from [`List`](crate::List) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListError {
    /// A cursor to a node that has been erased. Only cursors to the
    /// erased node itself go stale; all others remain valid.
    StaleCursor {
        /// Slot index encoded in the cursor.
        index: u32,
        /// Slot generation encoded in the cursor.
        generation: u32,
    },
    /// A cursor that belongs to a different list.
    ForeignCursor {
        /// The list the cursor was minted by.
        cursor_list: ListId,
        /// The list the cursor was presented to.
        list: ListId,
    },
    /// An index outside the valid range for the operation.
    OutOfRange {
        /// The offending index.
        index: u32,
        /// The list's length at the time of the call.
        len: u32,
    },
    /// The allocator could not provide space for a new node.
    AllocationFailed,
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleCursor { index, generation } => {
                write!(f, "stale cursor: slot {index}, generation {generation}")
            }
            Self::ForeignCursor { cursor_list, list } => {
                write!(
                    f,
                    "cursor from list {cursor_list} presented to list {list}"
                )
            }
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for list of length {len}")
            }
            Self::AllocationFailed => write!(f, "node allocation failed"),
        }
    }
}

impl Error for ListError {}
