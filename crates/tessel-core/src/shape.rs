//! Tensor shape descriptors and the [`Dims`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Dimension list of a tensor, outermost dimension first.
///
/// Inline capacity of 4 covers the common `[batch, heads, rows, cols]`
/// layout without heap allocation.
pub type Dims = SmallVec<[usize; 4]>;

/// An immutable tensor shape: an ordered sequence of dimension sizes.
///
/// The rank is the length of the sequence. A rank-0 shape describes a
/// scalar. Dimensions may be zero (an empty tensor).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Dims,
}

impl Shape {
    /// Create a shape from a dimension list.
    pub fn new(dims: Dims) -> Self {
        Self { dims }
    }

    /// Create a shape by copying a slice of dimensions.
    pub fn from_slice(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// The dimensions, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of elements, or `None` if the product overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Storage size in bytes for elements of `element_size` bytes each.
    ///
    /// Returns `None` on overflow.
    pub fn byte_len(&self, element_size: usize) -> Option<usize> {
        self.element_count()?.checked_mul(element_size)
    }

    /// Consume the shape, returning its dimension list.
    pub fn into_dims(self) -> Dims {
        self.dims
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str("]")
    }
}

impl From<Dims> for Shape {
    fn from(dims: Dims) -> Self {
        Self::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self {
            dims: SmallVec::from_vec(dims),
        }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::from_slice(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::from_slice(&dims)
    }
}
