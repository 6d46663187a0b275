//! Shaped views over arena storage.
//!
//! [`BlobRef`] and [`BlobMut`] are what a resolved [`BlobHandle`] turns into.
//! They borrow the arena's slab for as long as they live and deref to the
//! blob's flat `[f32]` data; [`BlobRef::at`] and [`BlobMut::at_mut`] index it
//! with the blob's logical shape.
//!
//! [`BlobHandle`]: crate::BlobHandle

use std::cell::{Ref, RefMut};
use std::fmt;
use std::ops::{Deref, DerefMut};

use thicket_core::Shape;

/// Read-only view of a blob.
///
/// Holds a shared borrow of the slab. While any `BlobRef` is alive, mutable
/// access to the same slab (through this arena or any arena merged with it)
/// fails with [`ParamsError::StorageBorrowed`](crate::ParamsError::StorageBorrowed).
pub struct BlobRef<'a> {
    data: Ref<'a, [f32]>,
    shape: Shape,
}

impl<'a> BlobRef<'a> {
    pub(crate) fn new(data: Ref<'a, [f32]>, shape: Shape) -> Self {
        Self { data, shape }
    }

    /// Logical shape of the blob.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Element at a multi-dimensional index, or `None` if out of bounds.
    pub fn at(&self, index: &[usize]) -> Option<f32> {
        let flat = self.shape.flat_index(index)?;
        self.data.get(flat).copied()
    }
}

impl Deref for BlobRef<'_> {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.data
    }
}

impl fmt::Debug for BlobRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobRef")
            .field("shape", &self.shape)
            .field("data", &&*self.data)
            .finish()
    }
}

/// Mutable view of a blob.
///
/// Holds an exclusive borrow of the slab; writes land directly in arena
/// storage and are visible to every later read of the same blob, including
/// reads through a parent the arena has been merged into.
pub struct BlobMut<'a> {
    data: RefMut<'a, [f32]>,
    shape: Shape,
}

impl<'a> BlobMut<'a> {
    pub(crate) fn new(data: RefMut<'a, [f32]>, shape: Shape) -> Self {
        Self { data, shape }
    }

    /// Logical shape of the blob.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Element at a multi-dimensional index, or `None` if out of bounds.
    pub fn at(&self, index: &[usize]) -> Option<f32> {
        let flat = self.shape.flat_index(index)?;
        self.data.get(flat).copied()
    }

    /// Mutable element at a multi-dimensional index.
    pub fn at_mut(&mut self, index: &[usize]) -> Option<&mut f32> {
        let flat = self.shape.flat_index(index)?;
        self.data.get_mut(flat)
    }
}

impl Deref for BlobMut<'_> {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.data
    }
}

impl DerefMut for BlobMut<'_> {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

impl fmt::Debug for BlobMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobMut")
            .field("shape", &self.shape)
            .field("data", &&*self.data)
            .finish()
    }
}
