//! The parameter arena.
//!
//! [`Params`] is the storage every layer of a model allocates its weights
//! from. Each layer calls [`Params::add`] once per tensor at construction,
//! then resolves the returned handle on every forward/backward pass. The
//! lifecycle of an arena is:
//!
//! 1. `add()`: bump-allocate named blobs, doubling the slab when full
//! 2. `get_gradient()`: lazily add the gradient row on first request
//! 3. `merge()`: a parent absorbs its children's storage and freezes
//!
//! After a merge the children alias a window of the parent's slab, so an
//! optimizer can walk every parameter of the model through the parent's
//! rows in one pass.

use std::cell::{Ref, RefMut};
use std::fmt;
use std::rc::Rc;

use thicket_core::{ArenaId, Row, Shape};
use tracing::{debug, trace};

use crate::config::ParamsConfig;
use crate::directory::{BlobDirectory, BlobEntry};
use crate::error::ParamsError;
use crate::handle::BlobHandle;
use crate::slab::{SharedSlab, Slab};
use crate::view::{BlobMut, BlobRef};

/// Growable arena of named parameter blobs with a lazily allocated
/// gradient row.
///
/// # Storage layout
///
/// ```text
///            base                 base+cursor  base+capacity
///             │                        │            │
/// row 0  ... [ W ][ b ][ W' ]...       [guard]      ] ...   values
/// row 1  ... [dW ][db ][dW' ]...       [guard]      ] ...   gradients (lazy)
/// ```
///
/// A standalone arena owns its whole slab (`base == 0`). An arena adopted
/// by [`Params::merge`] sees only its window of the parent's slab. One
/// column past the cursor is always held back as a guard, so available
/// space is `capacity - (cursor + 1)`.
///
/// # Freezing
///
/// `resizable` gates column reallocation. It is cleared on both sides of a
/// merge and never set again. A frozen arena can still gain its gradient
/// row, because that does not move any column.
pub struct Params {
    /// Unique id stamped into every handle this arena mints.
    id: ArenaId,
    /// Backing storage, shared with the parent/siblings after a merge.
    slab: SharedSlab,
    /// First slab column of this arena's window.
    base: usize,
    /// Width of this arena's window in columns.
    capacity: usize,
    /// Next free column, relative to `base`.
    cursor: usize,
    /// Whether the window may still be reallocated.
    resizable: bool,
    /// Bumped whenever the window moves (reallocation or adoption).
    epoch: u32,
    /// Name → location table.
    directory: BlobDirectory,
}

impl Params {
    /// Create a new arena.
    ///
    /// Returns `Err(ParamsError::InvalidArgument)` if the configured initial
    /// capacity is negative.
    pub fn new(config: ParamsConfig) -> Result<Self, ParamsError> {
        if config.initial_capacity < 0 {
            return Err(ParamsError::InvalidArgument {
                reason: format!(
                    "initial capacity must be non-negative (got {})",
                    config.initial_capacity,
                ),
            });
        }
        let capacity =
            usize::try_from(config.initial_capacity).map_err(|_| ParamsError::OutOfMemory {
                requested: usize::MAX,
            })?;
        Ok(Self::from_slab(Slab::new(capacity)?))
    }

    /// Create a new arena with the given initial capacity in columns.
    pub fn with_capacity(initial_capacity: i64) -> Result<Self, ParamsError> {
        Self::new(ParamsConfig::new(initial_capacity))
    }

    fn from_slab(slab: Slab) -> Self {
        let capacity = slab.capacity();
        Self {
            id: ArenaId::next(),
            slab: slab.into_shared(),
            base: 0,
            capacity,
            cursor: 0,
            resizable: true,
            epoch: 0,
            directory: BlobDirectory::new(),
        }
    }

    /// Allocate a blob of `shape` under `name` in the value row.
    ///
    /// A name that is already registered is silently re-pointed at the new
    /// blob; its previous columns stay allocated but become unreachable.
    /// Zero-size shapes are legal and yield an empty blob.
    ///
    /// Fails with `NotResizable` if the arena is frozen and out of space,
    /// or `OutOfMemory` if the size cannot be represented or allocated.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        shape: impl Into<Shape>,
    ) -> Result<BlobHandle, ParamsError> {
        let name = name.into();
        let shape = shape.into();
        let len = shape.numel().ok_or(ParamsError::OutOfMemory {
            requested: usize::MAX,
        })?;
        let offset = self.alloc_columns(len)?;

        if self.directory.contains(&name) {
            trace!(arena = %self.id, name = %name, "re-pointing existing blob name");
        }
        let handle = BlobHandle::new(self.id, self.epoch, Row::Value, offset, len, shape.clone());
        self.directory
            .insert_or_replace(name, BlobEntry { offset, len, shape });
        Ok(handle)
    }

    /// Look up a value blob.
    ///
    /// Returns `None` if `name` has not been added yet.
    pub fn get_value(&self, name: &str) -> Option<BlobHandle> {
        self.handle_for(name, Row::Value)
    }

    /// Look up a gradient blob, adding the gradient row first if needed.
    ///
    /// Returns `Ok(None)` if `name` has not been added yet. The gradient row
    /// is created even then, matching a first backward pass that looks up names
    /// before any blob exists.
    pub fn get_gradient(&mut self, name: &str) -> Result<Option<BlobHandle>, ParamsError> {
        self.ensure_gradients()?;
        Ok(self.handle_for(name, Row::Gradient))
    }

    /// Look up a blob in the given row.
    pub fn get(&mut self, name: &str, row: Row) -> Result<Option<BlobHandle>, ParamsError> {
        match row {
            Row::Value => Ok(self.get_value(name)),
            Row::Gradient => self.get_gradient(name),
        }
    }

    /// Look up a blob by its legacy name, where a `d_` prefix selects the
    /// gradient row.
    pub fn get_prefixed(&mut self, name: &str) -> Result<Option<BlobHandle>, ParamsError> {
        let (row, base) = Row::split_name(name);
        self.get(base, row)
    }

    /// Resolve a handle to a read-only view.
    pub fn read(&self, handle: &BlobHandle) -> Result<BlobRef<'_>, ParamsError> {
        self.check_handle(handle)?;
        let start = self.base + handle.offset;
        let slab = self.slab_ref()?;
        let data = Ref::filter_map(slab, |s| s.slice(handle.row, start, handle.len))
            .map_err(|_| ParamsError::MissingRow { row: handle.row })?;
        Ok(BlobRef::new(data, handle.shape.clone()))
    }

    /// Resolve a handle to a mutable view.
    ///
    /// Writes land in arena storage and are visible to later reads of the
    /// same blob, including through an arena this one was merged with.
    pub fn write(&mut self, handle: &BlobHandle) -> Result<BlobMut<'_>, ParamsError> {
        self.check_handle(handle)?;
        let start = self.base + handle.offset;
        let slab = self.slab_mut()?;
        let data = RefMut::filter_map(slab, |s| s.slice_mut(handle.row, start, handle.len))
            .map_err(|_| ParamsError::MissingRow { row: handle.row })?;
        Ok(BlobMut::new(data, handle.shape.clone()))
    }

    /// Read every committed column of one row of this arena's window.
    ///
    /// Returns `Ok(None)` for the gradient row if it has not been allocated.
    pub fn read_row(&self, row: Row) -> Result<Option<BlobRef<'_>>, ParamsError> {
        let (base, len) = (self.base, self.cursor);
        let slab = self.slab_ref()?;
        Ok(Ref::filter_map(slab, |s| s.slice(row, base, len))
            .ok()
            .map(|data| BlobRef::new(data, Shape::from(len))))
    }

    /// Run `f` over the committed value and gradient columns at once.
    ///
    /// Adds the gradient row first if needed. On a merged parent this covers
    /// every child's parameters, so one call performs a whole-model update.
    pub fn update_rows<R>(
        &mut self,
        f: impl FnOnce(&mut [f32], &mut [f32]) -> R,
    ) -> Result<R, ParamsError> {
        self.ensure_gradients()?;
        let mut slab = self.slab_mut()?;
        let (values, gradients) = slab
            .pair_mut(self.base, self.cursor)
            .ok_or(ParamsError::MissingRow { row: Row::Gradient })?;
        Ok(f(values, gradients))
    }

    /// Zero the committed gradient columns. No-op without a gradient row.
    pub fn zero_gradients(&mut self) -> Result<(), ParamsError> {
        let (base, len) = (self.base, self.cursor);
        let mut slab = self.slab_mut()?;
        if let Some(grads) = slab.slice_mut(Row::Gradient, base, len) {
            grads.fill(0.0);
        }
        Ok(())
    }

    /// Absorb `children` into this arena's storage.
    ///
    /// Sizes this arena for every child's committed columns, freezes it,
    /// then copies each child into its own window and points the child at
    /// that window. Children keep their directories; their handles go stale
    /// and must be fetched again.
    ///
    /// The required width is `cursor + 1 + Σ(child.cursor + 1)`: each child
    /// brings its guard column along and this arena keeps its own. If the
    /// capacity is smaller, the slab is reallocated to exactly that width,
    /// so `capacity()` afterwards equals the required width.
    ///
    /// An empty `children` is a no-op. Every failure leaves this arena and
    /// all children unchanged: a frozen child fails with `InvalidArgument`,
    /// a live view on storage shared with earlier children fails with
    /// `StorageBorrowed`, and growing a frozen arena fails with
    /// `NotResizable`.
    ///
    /// Merging also freezes *this* arena, so it cannot grow to absorb later
    /// children beyond the space it already has.
    pub fn merge<'c, I>(&mut self, children: I) -> Result<(), ParamsError>
    where
        I: IntoIterator<Item = &'c mut Params>,
    {
        let children: Vec<&'c mut Params> = children.into_iter().collect();
        if children.is_empty() {
            return Ok(());
        }
        if let Some(frozen) = children.iter().find(|c| !c.resizable) {
            return Err(ParamsError::InvalidArgument {
                reason: format!("cannot merge frozen arena {}", frozen.id),
            });
        }

        let required = children
            .iter()
            .try_fold(self.cursor + 1, |acc, c| acc.checked_add(c.committed()))
            .ok_or(ParamsError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let mut with_gradients = false;
        for child in &children {
            with_gradients |= child.has_gradients()?;
        }

        // Siblings adopted earlier may hold views; fail before anything moves.
        drop(self.slab_mut()?);
        if self.capacity < required {
            self.realloc(required, required, with_gradients)?;
        } else if with_gradients {
            self.ensure_gradients()?;
        }
        self.resizable = false;
        debug!(
            arena = %self.id,
            children = children.len(),
            required,
            capacity = self.capacity,
            "merging child arenas"
        );

        for child in children {
            let width = child.committed();
            let offset = self.alloc_columns(width)?;
            child.adopt(&self.slab, self.base + offset, width)?;
        }
        Ok(())
    }

    /// This arena's unique id.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Width of this arena's window in columns.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Next free column.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the arena may still reallocate its columns.
    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Current epoch. Handles minted in an earlier epoch are stale.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Whether the gradient row exists.
    ///
    /// Fails with `StorageBorrowed` while a mutable view on the shared
    /// storage is live.
    pub fn has_gradients(&self) -> Result<bool, ParamsError> {
        Ok(self.slab_ref()?.has_gradients())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.directory.contains(name)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    /// Whether no names are registered.
    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Iterate over registered blobs in first-insertion order.
    pub fn blobs(&self) -> impl Iterator<Item = (&str, &BlobEntry)> {
        self.directory.iter()
    }

    /// Memory covered by this arena's window across all rows, in bytes.
    pub fn memory_bytes(&self) -> Result<usize, ParamsError> {
        let rows = if self.has_gradients()? { 2 } else { 1 };
        Ok(rows * self.capacity * std::mem::size_of::<f32>())
    }

    /// Columns a parent must reserve to adopt this arena: the cursor plus
    /// the guard column.
    fn committed(&self) -> usize {
        self.cursor + 1
    }

    fn handle_for(&self, name: &str, row: Row) -> Option<BlobHandle> {
        let entry = self.directory.get(name)?;
        Some(BlobHandle::new(
            self.id,
            self.epoch,
            row,
            entry.offset,
            entry.len,
            entry.shape.clone(),
        ))
    }

    fn check_handle(&self, handle: &BlobHandle) -> Result<(), ParamsError> {
        if handle.arena != self.id {
            return Err(ParamsError::ForeignHandle {
                handle_arena: handle.arena,
                arena: self.id,
            });
        }
        if handle.epoch != self.epoch {
            return Err(ParamsError::StaleHandle {
                handle_epoch: handle.epoch,
                current_epoch: self.epoch,
            });
        }
        Ok(())
    }

    /// Bump-allocate `len` columns, growing the slab if the guard-adjusted
    /// free space is too small. Returns the window-relative offset.
    fn alloc_columns(&mut self, len: usize) -> Result<usize, ParamsError> {
        let available = self.capacity.saturating_sub(self.cursor + 1);
        if len > available {
            let new_capacity = self
                .capacity
                .max(len)
                .checked_mul(2)
                .ok_or(ParamsError::OutOfMemory { requested: len })?;
            self.realloc(new_capacity, len, false)?;
        }
        let offset = self.cursor;
        self.cursor += len;
        trace!(arena = %self.id, offset, len, "carved blob");
        Ok(offset)
    }

    /// Replace the slab with `new_capacity` columns, preserving everything
    /// up to and including the guard column. Leaves the arena untouched on
    /// failure.
    fn realloc(
        &mut self,
        new_capacity: usize,
        requested: usize,
        with_gradients: bool,
    ) -> Result<(), ParamsError> {
        if !self.resizable {
            return Err(ParamsError::NotResizable {
                requested,
                capacity: self.capacity,
            });
        }
        // Resizable arenas own their slab outright.
        debug_assert_eq!(self.base, 0);
        debug_assert_eq!(Rc::strong_count(&self.slab), 1);

        self.slab_mut()?
            .realloc(new_capacity, self.cursor + 1, with_gradients)?;
        debug!(
            arena = %self.id,
            old_capacity = self.capacity,
            new_capacity,
            "reallocated parameter slab"
        );
        self.capacity = new_capacity;
        self.epoch = self.epoch.wrapping_add(1);
        Ok(())
    }

    /// Add the gradient row to the (possibly shared) slab.
    ///
    /// Not gated on `resizable`: it adds a row without moving any column.
    fn ensure_gradients(&mut self) -> Result<(), ParamsError> {
        if self.slab_ref()?.has_gradients() {
            return Ok(());
        }
        let mut slab = self.slab_mut()?;
        if slab.alloc_gradients()? {
            debug!(
                arena = %self.id,
                columns = slab.capacity(),
                "allocated gradient row"
            );
        }
        Ok(())
    }

    /// Copy this arena's committed columns into `[base, base + width)` of
    /// `slab` and make that region this arena's storage.
    ///
    /// `slab` must already carry a gradient row if this arena has one.
    fn adopt(&mut self, slab: &SharedSlab, base: usize, width: usize) -> Result<(), ParamsError> {
        {
            let src = self.slab_ref()?;
            let mut dst = slab
                .try_borrow_mut()
                .map_err(|_| ParamsError::StorageBorrowed)?;
            let copy = width.min(src.capacity().saturating_sub(self.base));
            for row in [Row::Value, Row::Gradient] {
                if let (Some(from), Some(to)) = (
                    src.slice(row, self.base, copy),
                    dst.slice_mut(row, base, copy),
                ) {
                    to.copy_from_slice(from);
                }
            }
        }

        self.slab = Rc::clone(slab);
        self.base = base;
        self.capacity = width;
        self.resizable = false;
        self.epoch = self.epoch.wrapping_add(1);
        debug!(arena = %self.id, base, width, "adopted parent storage");
        Ok(())
    }

    fn slab_ref(&self) -> Result<Ref<'_, Slab>, ParamsError> {
        self.slab
            .try_borrow()
            .map_err(|_| ParamsError::StorageBorrowed)
    }

    fn slab_mut(&self) -> Result<RefMut<'_, Slab>, ParamsError> {
        self.slab
            .try_borrow_mut()
            .map_err(|_| ParamsError::StorageBorrowed)
    }
}

impl Default for Params {
    /// An arena with [`ParamsConfig::DEFAULT_INITIAL_CAPACITY`] columns.
    fn default() -> Self {
        let capacity = ParamsConfig::DEFAULT_INITIAL_CAPACITY as usize;
        Self::from_slab(Slab::from_values(vec![0.0; capacity]))
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("id", &self.id)
            .field("base", &self.base)
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor)
            .field("resizable", &self.resizable)
            .field("epoch", &self.epoch)
            .field("blobs", &self.directory.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(capacity: i64) -> Params {
        Params::with_capacity(capacity).unwrap()
    }

    #[test]
    fn new_arena_is_empty_and_resizable() {
        let p = Params::default();
        assert_eq!(p.capacity(), 128);
        assert_eq!(p.cursor(), 0);
        assert!(p.is_resizable());
        assert!(!p.has_gradients().unwrap());
        assert!(p.is_empty());
    }

    #[test]
    fn negative_capacity_is_invalid() {
        let err = Params::with_capacity(-1).unwrap_err();
        assert!(matches!(err, ParamsError::InvalidArgument { .. }));
    }

    #[test]
    fn zero_capacity_is_allowed() {
        let mut p = arena(0);
        let h = p.add("b", [3]).unwrap();
        assert_eq!(p.read(&h).unwrap().len(), 3);
        assert!(p.capacity() >= 4);
    }

    #[test]
    fn add_returns_zeroed_blob_of_shape() {
        let mut p = arena(32);
        let h = p.add("W", [2, 3]).unwrap();
        let view = p.read(&h).unwrap();
        assert_eq!(view.shape().dims(), &[2, 3]);
        assert_eq!(view.len(), 6);
        assert!(view.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn blobs_are_carved_sequentially() {
        let mut p = arena(32);
        let w = p.add("W", [2, 3]).unwrap();
        let b = p.add("b", [2]).unwrap();
        assert_eq!(w.offset(), 0);
        assert_eq!(b.offset(), 6);
        assert_eq!(p.cursor(), 8);
    }

    #[test]
    fn writes_are_visible_through_get() {
        let mut p = arena(32);
        let h = p.add("W", [2, 2]).unwrap();
        p.write(&h).unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let again = p.get_value("W").unwrap();
        let view = p.read(&again).unwrap();
        assert_eq!(&*view, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(view.at(&[1, 0]), Some(3.0));
    }

    #[test]
    fn unknown_name_is_absent() {
        let mut p = arena(32);
        assert!(p.get_value("W").is_none());
        assert!(p.get_gradient("W").unwrap().is_none());
        // The lookup still allocates the gradient row.
        assert!(p.has_gradients().unwrap());
    }

    #[test]
    fn readd_replaces_entry_without_freeing() {
        let mut p = arena(32);
        p.add("W", [4]).unwrap();
        let second = p.add("W", [2]).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.cursor(), 6);
        let h = p.get_value("W").unwrap();
        assert_eq!(h.offset(), second.offset());
        assert_eq!(h.shape().dims(), &[2]);
    }

    #[test]
    fn zero_size_blob_is_empty() {
        let mut p = arena(8);
        let h = p.add("empty", [0, 5]).unwrap();
        assert!(h.is_empty());
        assert_eq!(p.cursor(), 0);
        assert!(p.read(&h).unwrap().is_empty());
    }

    #[test]
    fn scalar_shape_takes_one_column() {
        let mut p = arena(8);
        let h = p.add("bias", Shape::scalar()).unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(p.cursor(), 1);
    }

    #[test]
    fn guard_column_is_reserved() {
        let mut p = arena(8);
        p.add("a", [7]).unwrap();
        assert_eq!(p.capacity(), 8);
        // Only the guard column is left, so a 1-column blob must grow.
        p.add("b", [1]).unwrap();
        assert_eq!(p.capacity(), 16);
    }

    #[test]
    fn growth_doubles_and_preserves_content() {
        let mut p = arena(8);
        let a = p.add("a", [3]).unwrap();
        p.write(&a).unwrap().copy_from_slice(&[1.0, 2.0, 3.0]);
        let epoch = p.epoch();

        p.add("big", [20]).unwrap();
        assert_eq!(p.capacity(), 40);
        assert_eq!(p.epoch(), epoch + 1);

        let a = p.get_value("a").unwrap();
        assert_eq!(&*p.read(&a).unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn handle_goes_stale_after_growth() {
        let mut p = arena(4);
        let a = p.add("a", [2]).unwrap();
        p.add("b", [8]).unwrap();
        assert!(matches!(
            p.read(&a),
            Err(ParamsError::StaleHandle { .. })
        ));
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let mut p = arena(8);
        let mut q = arena(8);
        let h = p.add("a", [2]).unwrap();
        q.add("a", [2]).unwrap();
        assert!(matches!(
            q.read(&h),
            Err(ParamsError::ForeignHandle { .. })
        ));
    }

    #[test]
    fn gradient_row_is_separate_from_values() {
        let mut p = arena(16);
        let w = p.add("W", [2, 2]).unwrap();
        p.write(&w).unwrap().fill(1.0);

        let dw = p.get_gradient("W").unwrap().unwrap();
        assert_eq!(dw.row(), Row::Gradient);
        assert_eq!(dw.shape().dims(), &[2, 2]);
        assert!(p.read(&dw).unwrap().iter().all(|&v| v == 0.0));

        p.write(&dw).unwrap().fill(0.5);
        let w = p.get_value("W").unwrap();
        assert!(p.read(&w).unwrap().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn gradient_growth_keeps_value_handles_valid() {
        let mut p = arena(16);
        let w = p.add("W", [3]).unwrap();
        p.write(&w).unwrap().copy_from_slice(&[1.0, 2.0, 3.0]);
        p.get_gradient("W").unwrap();
        assert_eq!(&*p.read(&w).unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn gradient_handle_without_row_is_missing() {
        let mut p = arena(16);
        let w = p.add("W", [3]).unwrap();
        let dw = w.with_row(Row::Gradient);
        assert!(matches!(
            p.read(&dw),
            Err(ParamsError::MissingRow { row: Row::Gradient })
        ));
    }

    #[test]
    fn prefixed_lookup_selects_row() {
        let mut p = arena(16);
        p.add("W", [2]).unwrap();
        let w = p.get_prefixed("W").unwrap().unwrap();
        let dw = p.get_prefixed("d_W").unwrap().unwrap();
        assert_eq!(w.row(), Row::Value);
        assert_eq!(dw.row(), Row::Gradient);
        assert_eq!(w.offset(), dw.offset());
        assert!(p.get_prefixed("d_b").unwrap().is_none());
    }

    #[test]
    fn growth_copies_gradient_row() {
        let mut p = arena(4);
        p.add("W", [2]).unwrap();
        let dw = p.get_gradient("W").unwrap().unwrap();
        p.write(&dw).unwrap().copy_from_slice(&[0.25, 0.5]);

        p.add("big", [10]).unwrap();
        let dw = p.get_gradient("W").unwrap().unwrap();
        assert_eq!(&*p.read(&dw).unwrap(), &[0.25, 0.5]);
    }

    #[test]
    fn live_read_blocks_write_without_panic() {
        let mut p = arena(8);
        p.add("W", [2]).unwrap();
        let mut q = arena(8);
        q.add("b", [1]).unwrap();
        p.merge([&mut q]).unwrap();

        let b = q.get_value("b").unwrap();
        let w = p.get_value("W").unwrap();
        let view = q.read(&b).unwrap();
        assert!(matches!(p.write(&w), Err(ParamsError::StorageBorrowed)));
        drop(view);
        assert!(p.write(&w).is_ok());
    }

    #[test]
    fn read_row_covers_committed_columns() {
        let mut p = arena(16);
        let a = p.add("a", [2]).unwrap();
        let b = p.add("b", [1]).unwrap();
        p.write(&a).unwrap().copy_from_slice(&[1.0, 2.0]);
        p.write(&b).unwrap()[0] = 3.0;

        let row = p.read_row(Row::Value).unwrap().unwrap();
        assert_eq!(&*row, &[1.0, 2.0, 3.0]);
        drop(row);
        assert!(p.read_row(Row::Gradient).unwrap().is_none());
    }

    #[test]
    fn update_rows_applies_sgd_step() {
        let mut p = arena(16);
        let w = p.add("W", [3]).unwrap();
        p.write(&w).unwrap().copy_from_slice(&[1.0, 1.0, 1.0]);
        let dw = p.get_gradient("W").unwrap().unwrap();
        p.write(&dw).unwrap().copy_from_slice(&[1.0, 2.0, 3.0]);

        p.update_rows(|values, grads| {
            for (v, g) in values.iter_mut().zip(grads.iter_mut()) {
                *v -= 0.5 * *g;
                *g = 0.0;
            }
        })
        .unwrap();

        assert_eq!(&*p.read(&w).unwrap(), &[0.5, 0.0, -0.5]);
        assert!(p.read(&dw).unwrap().iter().all(|&g| g == 0.0));
    }

    #[test]
    fn zero_gradients_clears_committed_columns() {
        let mut p = arena(16);
        p.add("W", [2]).unwrap();
        let dw = p.get_gradient("W").unwrap().unwrap();
        p.write(&dw).unwrap().fill(7.0);
        p.zero_gradients().unwrap();
        assert!(p.read(&dw).unwrap().iter().all(|&g| g == 0.0));
    }

    #[test]
    fn blobs_iterate_in_order() {
        let mut p = arena(16);
        p.add("W", [2, 2]).unwrap();
        p.add("b", [2]).unwrap();
        let names: Vec<&str> = p.blobs().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["W", "b"]);
    }

    #[test]
    fn memory_bytes_tracks_rows() {
        let mut p = arena(10);
        assert_eq!(p.memory_bytes().unwrap(), 40);
        p.get_gradient("W").unwrap();
        assert_eq!(p.memory_bytes().unwrap(), 80);
    }

    #[test]
    fn memory_bytes_fails_during_live_write() {
        let mut p = arena(10);
        p.add("W", [2]).unwrap();
        p.get_gradient("W").unwrap();
        let mut q = arena(4);
        q.add("b", [1]).unwrap();
        p.merge([&mut q]).unwrap();

        let b = q.get_value("b").unwrap();
        let view = q.write(&b).unwrap();
        assert_eq!(p.memory_bytes(), Err(ParamsError::StorageBorrowed));
        assert_eq!(p.has_gradients(), Err(ParamsError::StorageBorrowed));
        drop(view);
        assert_eq!(p.memory_bytes().unwrap(), 2 * p.capacity() * 4);
    }

    #[test]
    fn huge_initial_capacity_is_out_of_memory() {
        let err = Params::with_capacity(i64::MAX).unwrap_err();
        assert!(matches!(err, ParamsError::OutOfMemory { .. }));
    }

    #[test]
    fn huge_blob_is_out_of_memory_and_arena_survives() {
        let mut p = arena(8);
        let a = p.add("a", [2]).unwrap();
        p.write(&a).unwrap().copy_from_slice(&[1.0, 2.0]);

        let err = p.add("x", [usize::MAX / 4]).unwrap_err();
        assert!(matches!(err, ParamsError::OutOfMemory { .. }));
        assert_eq!(p.capacity(), 8);
        assert_eq!(p.cursor(), 2);
        assert!(!p.contains("x"));
        assert_eq!(&*p.read(&a).unwrap(), &[1.0, 2.0]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_shape() -> impl Strategy<Value = Vec<usize>> {
            prop::collection::vec(0usize..6, 0..4)
        }

        proptest! {
            #[test]
            fn cursor_stays_within_capacity(
                initial in 0i64..16,
                shapes in prop::collection::vec(arb_shape(), 1..20),
            ) {
                let mut p = Params::with_capacity(initial).unwrap();
                for (i, dims) in shapes.iter().enumerate() {
                    p.add(format!("p{i}"), dims.clone()).unwrap();
                    prop_assert!(p.cursor() <= p.capacity());
                    for (_, entry) in p.blobs() {
                        prop_assert!(entry.offset + entry.len <= p.cursor());
                    }
                }
            }

            #[test]
            fn added_blobs_keep_content_across_growth(
                shapes in prop::collection::vec(arb_shape(), 1..20),
            ) {
                let mut p = Params::with_capacity(2).unwrap();
                for (i, dims) in shapes.iter().enumerate() {
                    let h = p.add(format!("p{i}"), dims.clone()).unwrap();
                    p.write(&h).unwrap().fill(i as f32);
                }
                for (i, dims) in shapes.iter().enumerate() {
                    let h = p.get_value(&format!("p{i}")).unwrap();
                    let view = p.read(&h).unwrap();
                    prop_assert_eq!(view.shape().dims(), dims.as_slice());
                    prop_assert!(view.iter().all(|&v| v == i as f32));
                }
            }

            #[test]
            fn growth_at_least_doubles(
                initial in 1i64..64,
                request in 1usize..256,
            ) {
                let mut p = Params::with_capacity(initial).unwrap();
                let before = p.capacity();
                p.add("x", [request]).unwrap();
                if p.capacity() != before {
                    prop_assert!(p.capacity() >= before * 2);
                    prop_assert!(p.capacity() >= request);
                    prop_assert_eq!(p.epoch(), 1);
                }
            }
        }
    }
}
