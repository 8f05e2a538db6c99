//! The operator-facing shape inference trait.

use tessel_core::{Shape, ShapeError};

/// An operator whose output shapes are a function of its input shapes.
///
/// Implemented by operator descriptors; called by the graph framework
/// when a node is created or its inputs change. An `Err` means the
/// operands are invalid for this operator and should be reported to the
/// user; it never indicates partial success.
pub trait InferShape {
    /// Short operator name for diagnostics.
    fn name(&self) -> &str;

    /// Compute one shape per output from the input shapes.
    fn infer_shapes(&self, inputs: &[Shape]) -> Result<Vec<Shape>, ShapeError>;
}
