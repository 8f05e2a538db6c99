//! Tessel: arena offset planning and shape inference for tensor-graph compilers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Tessel sub-crates. Adding `tessel` as a single dependency is enough
//! for most graph compilers.
//!
//! # Quick start
//!
//! ```rust
//! use tessel::prelude::*;
//!
//! // A runtime that just remembers how much it was asked for.
//! struct HostRuntime;
//! impl Runtime for HostRuntime {
//!     type Buffer = Vec<u8>;
//!     fn alloc(&self, nbytes: usize) -> Result<Vec<u8>, RuntimeError> {
//!         Ok(vec![0; nbytes])
//!     }
//!     fn dealloc(&self, _buffer: Vec<u8>) {}
//! }
//!
//! // Infer the product's shape, then plan storage for operands and result.
//! let a = Shape::from([4, 3]);
//! let b = Shape::from([3, 2]);
//! let c = infer_matmul(a.dims(), b.dims(), false, false).unwrap();
//! assert_eq!(c, Shape::from([4, 2]));
//!
//! let mut arena = OffsetAllocator::new(HostRuntime);
//! let a_off = arena.alloc(a.byte_len(4).unwrap()).unwrap();
//! let b_off = arena.alloc(b.byte_len(4).unwrap()).unwrap();
//! let c_off = arena.alloc(c.byte_len(4).unwrap()).unwrap();
//! assert_eq!((a_off, b_off, c_off), (0, 48, 72));
//!
//! let buffer = arena.materialize().unwrap();
//! assert_eq!(buffer.len(), 104);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `tessel-arena` | `OffsetAllocator`, free-region bookkeeping, arena errors |
//! | [`types`] | `tessel-core` | `Shape`, ids, `Runtime` trait, shared errors |
//! | [`shape`] | `tessel-shape` | Broadcasting, the matrix-product rule, `InferShape` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arena offset allocation (`tessel-arena`).
pub use tessel_arena as arena;

/// Core types, traits, and ids (`tessel-core`).
pub use tessel_core as types;

/// Shape inference rules (`tessel-shape`).
pub use tessel_shape as shape;

/// Commonly used types, importable with `use tessel::prelude::*`.
pub mod prelude {
    pub use tessel_arena::{ArenaConfig, ArenaError, ArenaStats, OffsetAllocator};
    pub use tessel_core::{BufferId, Dims, Runtime, RuntimeError, Shape, ShapeError};
    pub use tessel_shape::{broadcast_batch, infer_matmul, InferShape, Matmul, MatmulPlan};
}
