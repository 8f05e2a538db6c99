//! Shape rule for the batched matrix product.
//!
//! Operands have shape `[..batch, rows, cols]`. The trailing two
//! dimensions of each operand form the matrices; everything before them
//! is broadcast with [`broadcast_batch`]. With both transpose flags off,
//! `A: [.., m, k]` times `B: [.., k, n]` yields `[..batch, m, n]`. A
//! transpose flag swaps the roles of its operand's trailing dimensions.

use std::fmt;

use tessel_core::error::Operand;
use tessel_core::{Shape, ShapeError};

use crate::broadcast::broadcast_batch;
use crate::rule::InferShape;

/// Rank below which an operand cannot be a matrix.
const MIN_RANK: usize = 2;

/// Matrix-product operator attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Matmul {
    /// Use `A`'s trailing two dimensions transposed.
    pub trans_a: bool,
    /// Use `B`'s trailing two dimensions transposed.
    pub trans_b: bool,
}

/// Resolved dimensions of a valid matrix product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatmulPlan {
    /// Output shape: broadcast batch dimensions followed by `[m, n]`.
    pub output: Shape,
    /// Rows of the (possibly transposed) left-hand matrix.
    pub m: usize,
    /// Columns of the (possibly transposed) right-hand matrix.
    pub n: usize,
    /// Contracted dimension.
    pub k: usize,
    /// Whether `A` was read transposed.
    pub trans_a: bool,
    /// Whether `B` was read transposed.
    pub trans_b: bool,
}

impl MatmulPlan {
    /// The broadcast batch dimensions (output without its trailing `[m, n]`).
    pub fn batch_dims(&self) -> &[usize] {
        let dims = self.output.dims();
        &dims[..dims.len() - MIN_RANK]
    }
}

impl Matmul {
    /// Create a matrix product with the given transpose flags.
    pub fn new(trans_a: bool, trans_b: bool) -> Self {
        Self { trans_a, trans_b }
    }

    /// Validate operand shapes and resolve the product's dimensions.
    ///
    /// Fails if either operand has rank below 2, if the batch dimensions
    /// cannot be broadcast, or if the contracted dimensions differ.
    pub fn plan(&self, lhs: &[usize], rhs: &[usize]) -> Result<MatmulPlan, ShapeError> {
        check_rank(Operand::Lhs, lhs)?;
        check_rank(Operand::Rhs, rhs)?;

        let (lhs_batch, lhs_mat) = lhs.split_at(lhs.len() - MIN_RANK);
        let (rhs_batch, rhs_mat) = rhs.split_at(rhs.len() - MIN_RANK);
        let mut dims = broadcast_batch(lhs_batch, rhs_batch)?;

        let (mut m, mut k_a) = (lhs_mat[0], lhs_mat[1]);
        if self.trans_a {
            std::mem::swap(&mut m, &mut k_a);
        }
        let (mut k_b, mut n) = (rhs_mat[0], rhs_mat[1]);
        if self.trans_b {
            std::mem::swap(&mut n, &mut k_b);
        }
        if k_a != k_b {
            return Err(ShapeError::InnerMismatch { lhs: k_a, rhs: k_b });
        }

        dims.push(m);
        dims.push(n);
        Ok(MatmulPlan {
            output: Shape::new(dims),
            m,
            n,
            k: k_a,
            trans_a: self.trans_a,
            trans_b: self.trans_b,
        })
    }
}

/// Infer the output shape of `lhs × rhs` under the given transpose flags.
///
/// Call `.ok()` on the result where only compatibility matters.
pub fn infer_matmul(
    lhs: &[usize],
    rhs: &[usize],
    trans_a: bool,
    trans_b: bool,
) -> Result<Shape, ShapeError> {
    Matmul::new(trans_a, trans_b)
        .plan(lhs, rhs)
        .map(|plan| plan.output)
}

fn check_rank(operand: Operand, dims: &[usize]) -> Result<(), ShapeError> {
    if dims.len() < MIN_RANK {
        return Err(ShapeError::RankTooLow {
            operand,
            rank: dims.len(),
            min: MIN_RANK,
        });
    }
    Ok(())
}

fn operand_labels(trans_a: bool, trans_b: bool) -> (&'static str, &'static str) {
    (
        if trans_a { "A^T" } else { "A" },
        if trans_b { "B^T" } else { "B" },
    )
}

impl fmt::Display for Matmul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = operand_labels(self.trans_a, self.trans_b);
        write!(f, "Matmul([{a},{b}])")
    }
}

impl fmt::Display for MatmulPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = operand_labels(self.trans_a, self.trans_b);
        write!(
            f,
            "Matmul([{a},{b}],out={},mnk=[{},{},{}])",
            self.output, self.m, self.n, self.k
        )
    }
}

impl InferShape for Matmul {
    fn name(&self) -> &str {
        "Matmul"
    }

    fn infer_shapes(&self, inputs: &[Shape]) -> Result<Vec<Shape>, ShapeError> {
        let [lhs, rhs] = inputs else {
            return Err(ShapeError::Arity {
                expected: 2,
                got: inputs.len(),
            });
        };
        let plan = self.plan(lhs.dims(), rhs.dims())?;
        Ok(vec![plan.output])
    }
}
