//! Two-row backing storage.
//!
//! A [`Slab`] is the contiguous memory behind one or more arenas: a value
//! row that always exists and a gradient row that is added on demand. Both
//! rows always have the same number of columns.
//!
//! Arenas that have been merged share one slab through [`SharedSlab`]. Each
//! arena sees a window `[base, base + capacity)` of the slab's columns.

use std::cell::RefCell;
use std::rc::Rc;

use thicket_core::Row;

use crate::error::ParamsError;

/// Shared handle to a slab. Merged arenas hold clones of the same handle.
pub(crate) type SharedSlab = Rc<RefCell<Slab>>;

/// Zero-initialised value and gradient rows of equal width.
#[derive(Debug)]
pub(crate) struct Slab {
    /// Row 0. Length is the slab's column capacity.
    values: Vec<f32>,
    /// Row 1, once allocated. Same length as `values`.
    gradients: Option<Vec<f32>>,
}

impl Slab {
    /// Create a one-row slab with `capacity` zeroed columns.
    ///
    /// Fails with `OutOfMemory` instead of aborting if the row cannot be
    /// allocated.
    pub(crate) fn new(capacity: usize) -> Result<Self, ParamsError> {
        Ok(Self::from_values(zeroed(capacity)?))
    }

    /// Wrap an existing value row.
    pub(crate) fn from_values(values: Vec<f32>) -> Self {
        Self {
            values,
            gradients: None,
        }
    }

    /// Move the slab behind a shared handle.
    pub(crate) fn into_shared(self) -> SharedSlab {
        Rc::new(RefCell::new(self))
    }

    /// Total column capacity.
    pub(crate) fn capacity(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn has_gradients(&self) -> bool {
        self.gradients.is_some()
    }

    /// Add a zero-filled gradient row spanning every column.
    ///
    /// The value row is left in place. Returns `Ok(false)` if the row
    /// already existed.
    pub(crate) fn alloc_gradients(&mut self) -> Result<bool, ParamsError> {
        if self.gradients.is_some() {
            return Ok(false);
        }
        self.gradients = Some(zeroed(self.values.len())?);
        Ok(true)
    }

    /// Replace both rows with `new_capacity` columns, keeping the first
    /// `preserve` columns of each row. With `with_gradients` set, a missing
    /// gradient row is created zeroed in the same step.
    ///
    /// `preserve` is clamped to both the old and the new capacity. Nothing
    /// is replaced unless every new row was allocated.
    pub(crate) fn realloc(
        &mut self,
        new_capacity: usize,
        preserve: usize,
        with_gradients: bool,
    ) -> Result<(), ParamsError> {
        let keep = preserve.min(self.values.len()).min(new_capacity);
        let values = regrow(&self.values, new_capacity, keep)?;
        let gradients = match self.gradients.as_deref() {
            Some(grads) => Some(regrow(grads, new_capacity, keep)?),
            None if with_gradients => Some(zeroed(new_capacity)?),
            None => None,
        };
        self.values = values;
        self.gradients = gradients;
        Ok(())
    }

    /// Shared slice of `row` over `[start, start + len)`.
    ///
    /// Returns `None` if the row does not exist or the range is out of bounds.
    pub(crate) fn slice(&self, row: Row, start: usize, len: usize) -> Option<&[f32]> {
        let end = start.checked_add(len)?;
        self.row(row)?.get(start..end)
    }

    /// Mutable slice of `row` over `[start, start + len)`.
    pub(crate) fn slice_mut(&mut self, row: Row, start: usize, len: usize) -> Option<&mut [f32]> {
        let end = start.checked_add(len)?;
        self.row_mut(row)?.get_mut(start..end)
    }

    /// Both rows over `[start, start + len)`, mutably and at once.
    ///
    /// Returns `None` if the gradient row is missing or the range is out of
    /// bounds.
    pub(crate) fn pair_mut(&mut self, start: usize, len: usize) -> Option<(&mut [f32], &mut [f32])> {
        let end = start.checked_add(len)?;
        let grads = self.gradients.as_mut()?.get_mut(start..end)?;
        let values = self.values.get_mut(start..end)?;
        Some((values, grads))
    }

    fn row(&self, row: Row) -> Option<&[f32]> {
        match row {
            Row::Value => Some(&self.values),
            Row::Gradient => self.gradients.as_deref(),
        }
    }

    fn row_mut(&mut self, row: Row) -> Option<&mut [f32]> {
        match row {
            Row::Value => Some(&mut self.values),
            Row::Gradient => self.gradients.as_deref_mut(),
        }
    }
}

/// A zero-filled row of `len` columns, or `OutOfMemory` if it cannot be
/// reserved.
fn zeroed(len: usize) -> Result<Vec<f32>, ParamsError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| ParamsError::OutOfMemory { requested: len })?;
    data.resize(len, 0.0);
    Ok(data)
}

fn regrow(old: &[f32], new_capacity: usize, keep: usize) -> Result<Vec<f32>, ParamsError> {
    let mut data = zeroed(new_capacity)?;
    data[..keep].copy_from_slice(&old[..keep]);
    Ok(data)
}
