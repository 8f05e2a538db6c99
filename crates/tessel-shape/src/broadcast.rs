//! NumPy-style broadcasting of leading (batch) dimensions.

use tessel_core::{Dims, ShapeError};

/// Broadcast a single pair of dimensions.
///
/// Equal dimensions, or a right-hand `1`, yield the left-hand value; a
/// left-hand `1` yields the right-hand value. Anything else is
/// incompatible.
pub fn broadcast_dim(lhs: usize, rhs: usize) -> Option<usize> {
    if lhs == rhs || rhs == 1 {
        Some(lhs)
    } else if lhs == 1 {
        Some(rhs)
    } else {
        None
    }
}

/// Broadcast two dimension lists aligned at their trailing ends.
///
/// Pairs are resolved with [`broadcast_dim`]. Once the shorter list is
/// exhausted, the remaining leading dimensions of the longer one are
/// carried through unchanged. Either list may be empty.
pub fn broadcast_batch(lhs: &[usize], rhs: &[usize]) -> Result<Dims, ShapeError> {
    let rank = lhs.len().max(rhs.len());
    let mut out = Dims::with_capacity(rank + 2);
    let mut lhs_rev = lhs.iter().rev();
    let mut rhs_rev = rhs.iter().rev();
    for from_end in 0..rank {
        let dim = match (lhs_rev.next(), rhs_rev.next()) {
            (Some(&l), Some(&r)) => broadcast_dim(l, r).ok_or(ShapeError::BatchMismatch {
                lhs: l,
                rhs: r,
                from_end,
            })?,
            (Some(&d), None) | (None, Some(&d)) => d,
            (None, None) => break,
        };
        out.push(dim);
    }
    out.reverse();
    Ok(out)
}
