//! Blob directory: name → `(offset, shape)`.
//!
//! The [`BlobDirectory`] is the metadata table of an arena. It uses
//! `IndexMap` (not `HashMap`) so iteration follows allocation order, which
//! keeps optimizer walks and debug dumps deterministic.

use indexmap::IndexMap;
use thicket_core::Shape;

/// A single entry in the directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobEntry {
    /// First column, relative to the owning arena's window.
    pub offset: usize,
    /// Number of columns (`shape.numel()`).
    pub len: usize,
    /// Logical shape.
    pub shape: Shape,
}

/// Maps blob names to their location within an arena.
#[derive(Clone, Debug, Default)]
pub struct BlobDirectory {
    entries: IndexMap<String, BlobEntry>,
}

impl BlobDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous entry with the same name.
    ///
    /// Returns the replaced entry. Its columns are not reclaimed; they stay
    /// allocated in the arena but are no longer reachable by name.
    pub fn insert_or_replace(&mut self, name: String, entry: BlobEntry) -> Option<BlobEntry> {
        self.entries.insert(name, entry)
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&BlobEntry> {
        self.entries.get(name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate over all entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlobEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no registered names.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
