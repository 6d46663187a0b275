//! Growable arena storage for neural-network parameters and gradients.
//!
//! Every layer of a model allocates its weights from a [`Params`] arena by
//! name, and reads or accumulates into them on every pass through the
//! [`BlobHandle`]s the arena returns.
//!
//! # Architecture
//!
//! ```text
//! Params (one per model or sub-model)
//! ├── Rc<RefCell<Slab>>   value row + lazy gradient row, shared after merge
//! ├── window              [base, base + capacity) of the slab's columns
//! ├── BlobDirectory       name → (offset, shape), insert-or-replace
//! └── epoch               bumped when the window moves; stales old handles
//! ```
//!
//! # Growth and freezing
//!
//! - **Growth:** a full arena reallocates to twice `max(capacity, request)`
//!   columns, copying both rows. Handles from before the move go stale.
//! - **Gradients:** the gradient row is added on the first gradient lookup,
//!   zero-filled, without touching the value row.
//! - **Merge:** a parent absorbs its children's columns into one block and
//!   both sides freeze. Children keep working, now aliasing the parent.
//!
//! Shared storage uses `Rc<RefCell<_>>`, so arenas are neither `Send` nor
//! `Sync`. Conflicting borrows surface as [`ParamsError::StorageBorrowed`]
//! rather than panics.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod directory;
pub mod error;
pub mod handle;
pub mod params;
mod slab;
pub mod view;

// Public re-exports for the primary API surface.
pub use config::ParamsConfig;
pub use directory::{BlobDirectory, BlobEntry};
pub use error::ParamsError;
pub use handle::BlobHandle;
pub use params::Params;
pub use view::{BlobMut, BlobRef};
