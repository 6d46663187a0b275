//! Parameter-arena error types.

use std::error::Error;
use std::fmt;

use thicket_core::{ArenaId, Row};

/// Errors that can occur during parameter-arena operations.
///
/// None of these are retried internally. They all indicate a contract
/// violation by the caller: bad construction input, a frozen arena that was
/// not sized before merging, or a handle used after its storage moved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamsError {
    /// An argument was rejected (negative capacity, frozen merge child).
    InvalidArgument {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// Column growth was required on an arena that is no longer resizable.
    NotResizable {
        /// Number of columns requested by the failing allocation.
        requested: usize,
        /// Current column capacity of the arena.
        capacity: usize,
    },
    /// The requested size cannot be represented or allocated.
    OutOfMemory {
        /// Number of columns requested, saturated at `usize::MAX`.
        requested: usize,
    },
    /// A [`BlobHandle`](crate::BlobHandle) minted before the arena's storage
    /// was reallocated or adopted by a parent.
    StaleHandle {
        /// The epoch encoded in the handle.
        handle_epoch: u32,
        /// The arena's current epoch.
        current_epoch: u32,
    },
    /// A handle minted by a different arena.
    ForeignHandle {
        /// The arena that minted the handle.
        handle_arena: ArenaId,
        /// The arena it was resolved against.
        arena: ArenaId,
    },
    /// A handle names a row the arena has not allocated.
    MissingRow {
        /// The missing row.
        row: Row,
    },
    /// The backing storage is already borrowed in a conflicting way.
    ///
    /// Merged arenas share one slab, so a live mutable view on a child
    /// blocks reads through the parent and vice versa.
    StorageBorrowed,
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::NotResizable {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena is not resizable: requested {requested} columns, capacity {capacity} columns"
                )
            }
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: cannot allocate {requested} columns")
            }
            Self::StaleHandle {
                handle_epoch,
                current_epoch,
            } => {
                write!(
                    f,
                    "stale handle: epoch {handle_epoch}, current epoch {current_epoch}"
                )
            }
            Self::ForeignHandle {
                handle_arena,
                arena,
            } => {
                write!(
                    f,
                    "handle from arena {handle_arena} resolved against arena {arena}"
                )
            }
            Self::MissingRow { row } => write!(f, "arena has no {row} row"),
            Self::StorageBorrowed => f.write_str("arena storage is already borrowed"),
        }
    }
}

impl Error for ParamsError {}
