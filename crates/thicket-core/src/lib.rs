//! Core types for the Thicket parameter toolkit.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the parameter arena and its collaborators: arena
//! identifiers, blob shapes, and the value/gradient row selector.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod row;
pub mod shape;

pub use id::ArenaId;
pub use row::Row;
pub use shape::Shape;
