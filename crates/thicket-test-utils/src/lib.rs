//! Test fixtures for Thicket development.
//!
//! Provides blob layouts that mirror real layer compositions and helpers to
//! fill and snapshot an arena, so merge and growth tests can check content
//! bit-for-bit.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    build_arena, fill_distinct, maxout_blobs, snapshot_values, softmax_blobs, BlobSnapshot,
};
