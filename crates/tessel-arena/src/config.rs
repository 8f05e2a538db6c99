//! Arena configuration parameters.

/// Configuration for the offset allocator.
///
/// Validated at construction; immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Granularity of every reservation, in bytes.
    ///
    /// Default: 8, the size of the widest supported scalar element
    /// (`u64`/`f64`). Must be non-zero. Every offset handed out is a
    /// multiple of this value.
    pub alignment: usize,
}

impl ArenaConfig {
    /// Default alignment: the size of the widest scalar element type.
    pub const DEFAULT_ALIGNMENT: usize = std::mem::size_of::<u64>();

    /// Create a config with the given alignment.
    pub fn new(alignment: usize) -> Self {
        Self { alignment }
    }

    /// Round `size` up to the next multiple of the alignment.
    ///
    /// A zero size still occupies one alignment unit. Returns `None` if
    /// the rounded size does not fit in `usize` or the alignment is zero.
    pub fn aligned_size(&self, size: usize) -> Option<usize> {
        if self.alignment == 0 {
            return None;
        }
        let units = size.max(1).div_ceil(self.alignment);
        units.checked_mul(self.alignment)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALIGNMENT)
    }
}
