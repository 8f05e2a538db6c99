//! Static shape inference for Tessel operators.
//!
//! Shape rules are pure functions of their input shapes and attributes.
//! They never touch graph state, so the same rule serves graph
//! validation and offline shape-only tooling.
//!
//! Currently provides the matrix-product rule ([`infer_matmul`]) with
//! NumPy-style broadcasting of leading batch dimensions
//! ([`broadcast_batch`]), and the [`InferShape`] seam through which the
//! graph framework invokes operator rules.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod broadcast;
pub mod matmul;
pub mod rule;

pub use broadcast::broadcast_batch;
pub use matmul::{infer_matmul, Matmul, MatmulPlan};
pub use rule::InferShape;
