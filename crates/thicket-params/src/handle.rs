//! Blob handles.
//!
//! A [`BlobHandle`] encodes where a blob lives within an arena's window. It
//! is epoch-scoped: the `epoch` field lets [`Params`](crate::Params) reject a
//! handle in O(1) once the storage it was minted against has moved.

use std::fmt;

use thicket_core::{ArenaId, Row, Shape};

/// Location of a blob within a parameter arena.
///
/// Handles are cheap tokens, not views. Resolve them with
/// [`Params::read`](crate::Params::read) or
/// [`Params::write`](crate::Params::write) on every access; a handle that
/// outlives a reallocation fails with
/// [`ParamsError::StaleHandle`](crate::ParamsError::StaleHandle).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobHandle {
    /// Arena that minted this handle.
    pub(crate) arena: ArenaId,
    /// Arena epoch at the time the handle was minted.
    pub(crate) epoch: u32,
    /// Which row the handle reads.
    pub(crate) row: Row,
    /// First column, relative to the arena's window.
    pub(crate) offset: usize,
    /// Number of columns.
    pub(crate) len: usize,
    /// Logical shape of the blob.
    pub(crate) shape: Shape,
}

impl BlobHandle {
    pub(crate) fn new(
        arena: ArenaId,
        epoch: u32,
        row: Row,
        offset: usize,
        len: usize,
        shape: Shape,
    ) -> Self {
        Self {
            arena,
            epoch,
            row,
            offset,
            len,
            shape,
        }
    }

    /// The arena this handle belongs to.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// The epoch this handle belongs to.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// The row this handle reads.
    pub fn row(&self) -> Row {
        self.row
    }

    /// First column of the blob within the arena's window.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of elements in the blob.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-size blob.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Logical shape of the blob.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The same blob in the other row.
    ///
    /// Value and gradient blobs share offsets, so this is how a layer that
    /// already holds a value handle reaches its gradient. The gradient row
    /// must exist before the returned handle is resolved.
    pub fn with_row(&self, row: Row) -> Self {
        Self {
            row,
            ..self.clone()
        }
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlobHandle(arena={}, epoch={}, {}, off={}, shape={})",
            self.arena, self.epoch, self.row, self.offset, self.shape
        )
    }
}
