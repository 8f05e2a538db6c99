//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use tessel_core::RuntimeError;

/// Layout-changing operation attempted on a frozen arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaOp {
    /// [`OffsetAllocator::alloc`](crate::OffsetAllocator::alloc).
    Alloc,
    /// [`OffsetAllocator::free`](crate::OffsetAllocator::free).
    Free,
}

impl fmt::Display for ArenaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc => f.write_str("alloc"),
            Self::Free => f.write_str("free"),
        }
    }
}

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The backing buffer has been materialized; the layout is frozen.
    ///
    /// This is a caller bug, not a condition to retry.
    Frozen {
        /// The rejected operation.
        op: ArenaOp,
    },
    /// Rounding the request up to the alignment, or growing the arena by
    /// it, would overflow `usize`.
    SizeOverflow {
        /// Number of bytes requested.
        requested: usize,
        /// Configured alignment.
        alignment: usize,
    },
    /// The arena configuration is unusable.
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
    /// The runtime failed to provide the backing buffer.
    Runtime(RuntimeError),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frozen { op } => {
                write!(f, "arena is frozen: {op} after backing buffer was materialized")
            }
            Self::SizeOverflow {
                requested,
                alignment,
            } => {
                write!(
                    f,
                    "arena size overflow: requested {requested} bytes at alignment {alignment}"
                )
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
            Self::Runtime(err) => write!(f, "backing allocation failed: {err}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Runtime(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RuntimeError> for ArenaError {
    fn from(err: RuntimeError) -> Self {
        Self::Runtime(err)
    }
}
