//! Thicket: parameter storage for small neural-network toolkits.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Thicket sub-crates. For most users, adding `thicket` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use thicket::prelude::*;
//!
//! // Each layer gets its own arena while the model is being built.
//! let mut hidden = Params::default();
//! let w = hidden.add("W", [4, 3]).unwrap();
//! hidden.write(&w).unwrap().fill(0.1);
//!
//! let mut output = Params::default();
//! output.add("W", [2, 4]).unwrap();
//!
//! // Fold both layers into one block for whole-model updates.
//! let mut model = Params::default();
//! model.merge([&mut hidden, &mut output]).unwrap();
//!
//! // Layers fetch fresh handles after the merge.
//! let dw = hidden.get_gradient("W").unwrap().unwrap();
//! hidden.write(&dw).unwrap().fill(1.0);
//!
//! // One SGD step over every layer's parameters.
//! model
//!     .update_rows(|values, grads| {
//!         for (v, g) in values.iter_mut().zip(grads.iter()) {
//!             *v -= 0.1 * *g;
//!         }
//!     })
//!     .unwrap();
//!
//! let w = hidden.get_value("W").unwrap();
//! assert!(hidden.read(&w).unwrap().iter().all(|&v| v.abs() < 1e-6));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`params`] | `thicket-params` | `Params` arena, handles, views, errors |
//! | [`types`] | `thicket-core` | `ArenaId`, `Shape`, `Row` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Parameter arena, handles, and views (`thicket-params`).
pub use thicket_params as params;

/// Core identifiers and shape types (`thicket-core`).
pub use thicket_core as types;

/// Common imports for typical Thicket usage.
///
/// ```rust
/// use thicket::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use thicket_core::{ArenaId, Row, Shape};

    // Arena
    pub use thicket_params::{BlobHandle, BlobMut, BlobRef, Params, ParamsConfig, ParamsError};
}
