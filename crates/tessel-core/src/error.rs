//! Error types shared across the Tessel workspace.
//!
//! [`ShapeError`] is the recoverable "not inferable" outcome of shape
//! rules. [`RuntimeError`] reports failures of the external runtime that
//! owns physical memory.

use std::error::Error;
use std::fmt;

/// Which operand of a binary operator an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// The left-hand input (`A`).
    Lhs,
    /// The right-hand input (`B`).
    Rhs,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lhs => f.write_str("lhs"),
            Self::Rhs => f.write_str("rhs"),
        }
    }
}

/// Reasons a shape rule cannot produce an output shape.
///
/// Callers are expected to surface these as "invalid operands"
/// diagnostics; none of them indicate a bug in the rule itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeError {
    /// An operand has fewer dimensions than the rule requires.
    RankTooLow {
        /// The offending operand.
        operand: Operand,
        /// Its actual rank.
        rank: usize,
        /// The minimum rank the rule accepts.
        min: usize,
    },
    /// A pair of batch dimensions cannot be broadcast together.
    BatchMismatch {
        /// Left-hand dimension.
        lhs: usize,
        /// Right-hand dimension.
        rhs: usize,
        /// Distance of the pair from the end of the batch prefix (0 = innermost).
        from_end: usize,
    },
    /// The contracted dimensions of a matrix product differ.
    InnerMismatch {
        /// `k` as seen from the left-hand operand.
        lhs: usize,
        /// `k` as seen from the right-hand operand.
        rhs: usize,
    },
    /// The operator received the wrong number of inputs.
    Arity {
        /// Inputs the operator takes.
        expected: usize,
        /// Inputs supplied.
        got: usize,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RankTooLow { operand, rank, min } => {
                write!(f, "{operand} has rank {rank}, expected at least {min}")
            }
            Self::BatchMismatch { lhs, rhs, from_end } => {
                write!(
                    f,
                    "batch dimensions {lhs} and {rhs} cannot be broadcast (position {from_end} from the end)"
                )
            }
            Self::InnerMismatch { lhs, rhs } => {
                write!(f, "contracted dimension mismatch: lhs {lhs} vs rhs {rhs}")
            }
            Self::Arity { expected, got } => {
                write!(f, "expected {expected} inputs, got {got}")
            }
        }
    }
}

impl Error for ShapeError {}

/// Failure reported by a [`Runtime`](crate::Runtime) implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeError {
    /// Human-readable description of the failure.
    pub reason: String,
}

impl RuntimeError {
    /// Create a runtime error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runtime error: {}", self.reason)
    }
}

impl Error for RuntimeError {}
