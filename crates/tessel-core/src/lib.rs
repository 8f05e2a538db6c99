//! Core types and traits for the Tessel tensor-graph compiler.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the arena allocator and the shape rules:
//! shape descriptors, buffer ids, error types, and the [`Runtime`]
//! collaborator trait through which physical memory is obtained.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod shape;
pub mod traits;

pub use error::{Operand, RuntimeError, ShapeError};
pub use id::BufferId;
pub use shape::{Dims, Shape};
pub use traits::Runtime;
