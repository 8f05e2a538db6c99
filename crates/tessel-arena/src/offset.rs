//! First-fit offset allocator over a single lazily materialized buffer.
//!
//! [`OffsetAllocator`] plans where each tensor lives inside one arena
//! buffer. The graph compiler calls [`alloc`](OffsetAllocator::alloc) and
//! [`free`](OffsetAllocator::free) in whatever order its liveness analysis
//! dictates; each call only moves offsets around. Physical memory is
//! requested from the [`Runtime`] once, sized to the final peak, when
//! [`materialize`](OffsetAllocator::materialize) is first called.
//!
//! # Placement policy
//!
//! 1. First hole (in scan order) with enough room: reuse its start and
//!    keep any leftover as a smaller hole.
//! 2. Otherwise, if a hole ends exactly at the peak, extend the arena by
//!    the shortfall and reuse that hole.
//! 3. Otherwise append at the peak.
//!
//! Freeing the range that ends at the peak retracts the peak instead of
//! recording a hole. Any other freed range is merged with adjacent holes.

use std::fmt;

use tessel_core::Runtime;
use tracing::{debug, info, trace};

use crate::backing::Backing;
use crate::config::ArenaConfig;
use crate::error::{ArenaError, ArenaOp};
use crate::free_list::{Fit, FreeRegions};

/// Read-only allocator diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Aligned bytes requested over the allocator's lifetime. Never
    /// decreases on free.
    pub used_bytes: usize,
    /// Current extent of the arena: one past the highest byte in use or
    /// recorded as a hole.
    pub peak_bytes: usize,
    /// Number of recorded holes.
    pub free_region_count: usize,
    /// Bytes held in recorded holes.
    pub free_bytes: usize,
}

impl fmt::Display for ArenaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "used {} bytes, peak {} bytes, {} free regions ({} bytes)",
            self.used_bytes, self.peak_bytes, self.free_region_count, self.free_bytes
        )
    }
}

/// Assigns aligned byte offsets within one arena buffer.
///
/// Single-threaded by construction (`&mut self` on every mutation). Each
/// arena owns its own allocator; nothing is shared between instances.
///
/// The allocator exclusively owns the runtime buffer once materialized
/// and hands it back to the runtime when dropped.
pub struct OffsetAllocator<R: Runtime> {
    runtime: R,
    config: ArenaConfig,
    used: usize,
    peak: usize,
    free: FreeRegions,
    backing: Backing<R::Buffer>,
}

impl<R: Runtime> OffsetAllocator<R> {
    /// Create an allocator with the default 8-byte alignment.
    pub fn new(runtime: R) -> Self {
        Self::build(runtime, ArenaConfig::default())
    }

    /// Create an allocator with an explicit configuration.
    pub fn with_config(runtime: R, config: ArenaConfig) -> Result<Self, ArenaError> {
        if config.alignment == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "alignment must be non-zero".into(),
            });
        }
        Ok(Self::build(runtime, config))
    }

    fn build(runtime: R, config: ArenaConfig) -> Self {
        Self {
            runtime,
            config,
            used: 0,
            peak: 0,
            free: FreeRegions::new(),
            backing: Backing::Pending,
        }
    }

    /// Reserve `size` bytes and return the offset of the reservation.
    ///
    /// The size is rounded up to the alignment; zero reserves one
    /// alignment unit. Fails with [`ArenaError::Frozen`] once the backing
    /// buffer exists.
    pub fn alloc(&mut self, size: usize) -> Result<usize, ArenaError> {
        self.ensure_mutable(ArenaOp::Alloc)?;
        let size = self.aligned(size)?;

        let offset = match self.free.first_fit(size, self.peak) {
            Fit::Region { start, len } => {
                self.free.take(start);
                if len > size {
                    self.free.insert(start + size, len - size);
                }
                start
            }
            Fit::Tail { start, len } => {
                let grow = size - len;
                self.peak = self.grown_peak(grow, size)?;
                self.free.take(start);
                debug!(offset = start, hole = len, grow, peak = self.peak, "extended tail hole");
                start
            }
            Fit::None => {
                let start = self.peak;
                self.peak = self.grown_peak(size, size)?;
                start
            }
        };

        self.used = self.used.saturating_add(size);
        trace!(offset, size, peak = self.peak, "alloc");
        Ok(offset)
    }

    /// Release a reservation previously returned by [`alloc`](Self::alloc).
    ///
    /// `size` must be the size passed to the matching `alloc` call; it is
    /// rounded the same way. Double frees and ranges that overlap live
    /// reservations are not detected. Fails with [`ArenaError::Frozen`]
    /// once the backing buffer exists.
    pub fn free(&mut self, offset: usize, size: usize) -> Result<(), ArenaError> {
        self.ensure_mutable(ArenaOp::Free)?;
        let size = self.aligned(size)?;
        let end = offset.checked_add(size).ok_or(ArenaError::SizeOverflow {
            requested: size,
            alignment: self.config.alignment,
        })?;
        debug_assert!(
            end <= self.peak,
            "freed range [{offset}, {end}) extends past peak {}",
            self.peak
        );

        if end == self.peak {
            self.peak = offset;
            trace!(offset, size, peak = self.peak, "free retracted peak");
            return Ok(());
        }

        let (start, len) = self.free.release(offset, size);
        trace!(offset, size, hole_start = start, hole_len = len, "free");
        Ok(())
    }

    /// Acquire the backing buffer, sized to the current peak.
    ///
    /// The first successful call asks the runtime for exactly
    /// `peak_bytes` bytes and freezes the layout. Later calls return the
    /// same buffer without contacting the runtime. If the runtime fails,
    /// nothing changes and the call may be retried.
    pub fn materialize(&mut self) -> Result<&R::Buffer, ArenaError> {
        let runtime = &self.runtime;
        let peak = self.peak;
        let used = self.used;
        let buffer = self.backing.get_or_try_materialize(|| {
            let buffer = runtime.alloc(peak)?;
            info!(bytes = peak, used, "materialized arena backing buffer");
            Ok::<_, ArenaError>(buffer)
        })?;
        Ok(buffer)
    }

    /// Whether the backing buffer has been acquired.
    pub fn is_materialized(&self) -> bool {
        self.backing.is_materialized()
    }

    /// The backing buffer, if acquired.
    pub fn backing(&self) -> Option<&R::Buffer> {
        self.backing.buffer()
    }

    /// Current allocator diagnostics. No side effects.
    pub fn diagnostics(&self) -> ArenaStats {
        ArenaStats {
            used_bytes: self.used,
            peak_bytes: self.peak,
            free_region_count: self.free.len(),
            free_bytes: self.free.total_bytes(),
        }
    }

    /// Emit the current diagnostics at `info` level.
    pub fn log_stats(&self) {
        let stats = self.diagnostics();
        info!(
            used_bytes = stats.used_bytes,
            peak_bytes = stats.peak_bytes,
            free_regions = stats.free_region_count,
            free_bytes = stats.free_bytes,
            "arena stats"
        );
    }

    /// Recorded holes as `(start, len)`, sorted by start.
    pub fn free_regions(&self) -> Vec<(usize, usize)> {
        self.free.sorted()
    }

    /// Configured alignment in bytes.
    pub fn alignment(&self) -> usize {
        self.config.alignment
    }

    fn ensure_mutable(&self, op: ArenaOp) -> Result<(), ArenaError> {
        if self.backing.is_materialized() {
            return Err(ArenaError::Frozen { op });
        }
        Ok(())
    }

    fn aligned(&self, size: usize) -> Result<usize, ArenaError> {
        self.config
            .aligned_size(size)
            .ok_or(ArenaError::SizeOverflow {
                requested: size,
                alignment: self.config.alignment,
            })
    }

    fn grown_peak(&self, grow: usize, requested: usize) -> Result<usize, ArenaError> {
        self.peak.checked_add(grow).ok_or(ArenaError::SizeOverflow {
            requested,
            alignment: self.config.alignment,
        })
    }
}

impl<R: Runtime> Drop for OffsetAllocator<R> {
    fn drop(&mut self) {
        if let Some(buffer) = self.backing.take() {
            debug!(bytes = self.peak, "releasing arena backing buffer");
            self.runtime.dealloc(buffer);
        }
    }
}

impl<R: Runtime> fmt::Debug for OffsetAllocator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffsetAllocator")
            .field("alignment", &self.config.alignment)
            .field("used", &self.used)
            .field("peak", &self.peak)
            .field("free", &self.free.sorted())
            .field("materialized", &self.backing.is_materialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessel_test_utils::MockRuntime;

    fn allocator() -> OffsetAllocator<MockRuntime> {
        OffsetAllocator::new(MockRuntime::new())
    }

    #[test]
    fn sequential_allocs_are_contiguous() {
        let mut arena = allocator();
        assert_eq!(arena.alloc(8).unwrap(), 0);
        assert_eq!(arena.alloc(16).unwrap(), 8);
        assert_eq!(arena.alloc(4).unwrap(), 24);
        assert_eq!(arena.diagnostics().peak_bytes, 32);
    }

    #[test]
    fn sizes_round_up_to_alignment() {
        let mut arena = allocator();
        assert_eq!(arena.alloc(3).unwrap(), 0);
        assert_eq!(arena.alloc(9).unwrap(), 8);
        assert_eq!(arena.diagnostics().peak_bytes, 24);
        assert_eq!(arena.diagnostics().used_bytes, 24);
    }

    #[test]
    fn zero_size_reserves_one_unit() {
        let mut arena = allocator();
        assert_eq!(arena.alloc(0).unwrap(), 0);
        assert_eq!(arena.alloc(0).unwrap(), 8);
        assert_eq!(arena.diagnostics().peak_bytes, 16);
    }

    #[test]
    fn freeing_tail_retracts_peak() {
        let mut arena = allocator();
        arena.alloc(16).unwrap();
        let b = arena.alloc(32).unwrap();
        arena.free(b, 32).unwrap();
        assert_eq!(arena.diagnostics().peak_bytes, 16);
        assert!(arena.free_regions().is_empty());
    }

    #[test]
    fn freeing_interior_records_hole() {
        let mut arena = allocator();
        let a = arena.alloc(16).unwrap();
        arena.alloc(8).unwrap();
        arena.free(a, 16).unwrap();
        assert_eq!(arena.free_regions(), vec![(0, 16)]);
        assert_eq!(arena.diagnostics().peak_bytes, 24);
    }

    #[test]
    fn exact_size_hole_is_reused_and_removed() {
        let mut arena = allocator();
        let a = arena.alloc(16).unwrap();
        arena.alloc(8).unwrap();
        arena.free(a, 16).unwrap();
        assert_eq!(arena.alloc(16).unwrap(), a);
        assert!(arena.free_regions().is_empty());
        assert_eq!(arena.diagnostics().peak_bytes, 24);
    }

    #[test]
    fn larger_hole_is_split() {
        let mut arena = allocator();
        let a = arena.alloc(32).unwrap();
        arena.alloc(8).unwrap();
        arena.free(a, 32).unwrap();
        assert_eq!(arena.alloc(8).unwrap(), 0);
        assert_eq!(arena.free_regions(), vec![(8, 24)]);
    }

    #[test]
    fn tail_hole_is_extended_by_shortfall() {
        let mut arena = allocator();
        arena.alloc(8).unwrap();
        let b = arena.alloc(8).unwrap();
        let c = arena.alloc(8).unwrap();
        // Free b (hole at 8..16), then c (tail): peak retracts to 16 and
        // the hole at 8..16 now ends at the peak.
        arena.free(b, 8).unwrap();
        arena.free(c, 8).unwrap();
        assert_eq!(arena.diagnostics().peak_bytes, 16);
        assert_eq!(arena.free_regions(), vec![(8, 8)]);

        assert_eq!(arena.alloc(24).unwrap(), 8);
        assert_eq!(arena.diagnostics().peak_bytes, 32);
        assert!(arena.free_regions().is_empty());
    }

    #[test]
    fn free_coalesces_with_both_neighbours() {
        let mut arena = allocator();
        let a = arena.alloc(8).unwrap();
        let b = arena.alloc(8).unwrap();
        let c = arena.alloc(8).unwrap();
        arena.alloc(8).unwrap();
        arena.free(a, 8).unwrap();
        arena.free(c, 8).unwrap();
        assert_eq!(arena.free_regions(), vec![(0, 8), (16, 8)]);
        arena.free(b, 8).unwrap();
        assert_eq!(arena.free_regions(), vec![(0, 24)]);
    }

    #[test]
    fn used_bytes_never_decreases() {
        let mut arena = allocator();
        let a = arena.alloc(8).unwrap();
        arena.free(a, 8).unwrap();
        arena.alloc(8).unwrap();
        assert_eq!(arena.diagnostics().used_bytes, 16);
        assert_eq!(arena.diagnostics().peak_bytes, 8);
    }

    #[test]
    fn materialize_requests_peak_bytes_once() {
        let runtime = Arc::new(MockRuntime::new());
        let mut arena = OffsetAllocator::new(Arc::clone(&runtime));
        arena.alloc(20).unwrap();
        arena.alloc(8).unwrap();
        let first = arena.materialize().unwrap().clone();
        let second = arena.materialize().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.len, 32);
        assert_eq!(runtime.alloc_calls(), 1);
        assert_eq!(runtime.requests(), vec![32]);
    }

    #[test]
    fn alloc_after_materialize_is_rejected() {
        let mut arena = allocator();
        arena.alloc(8).unwrap();
        arena.materialize().unwrap();
        assert_eq!(
            arena.alloc(8),
            Err(ArenaError::Frozen { op: ArenaOp::Alloc })
        );
    }

    #[test]
    fn free_after_materialize_is_rejected() {
        let mut arena = allocator();
        let a = arena.alloc(8).unwrap();
        arena.materialize().unwrap();
        assert_eq!(
            arena.free(a, 8),
            Err(ArenaError::Frozen { op: ArenaOp::Free })
        );
        assert_eq!(arena.diagnostics().peak_bytes, 8);
    }

    #[test]
    fn failed_materialize_leaves_arena_mutable() {
        let mut arena = OffsetAllocator::new(MockRuntime::failing("no device"));
        arena.alloc(8).unwrap();
        let err = arena.materialize().unwrap_err();
        assert!(matches!(err, ArenaError::Runtime(_)));
        assert!(!arena.is_materialized());
        assert_eq!(arena.alloc(8).unwrap(), 8);
    }

    #[test]
    fn drop_deallocates_materialized_buffer() {
        let runtime = Arc::new(MockRuntime::new());
        {
            let mut arena = OffsetAllocator::new(Arc::clone(&runtime));
            arena.alloc(64).unwrap();
            arena.materialize().unwrap();
            assert_eq!(runtime.live_buffers(), 1);
        }
        assert_eq!(runtime.dealloc_calls(), 1);
        assert_eq!(runtime.live_buffers(), 0);
    }

    #[test]
    fn drop_without_materialize_never_touches_runtime() {
        let runtime = Arc::new(MockRuntime::new());
        {
            let mut arena = OffsetAllocator::new(Arc::clone(&runtime));
            arena.alloc(64).unwrap();
        }
        assert_eq!(runtime.alloc_calls(), 0);
        assert_eq!(runtime.dealloc_calls(), 0);
    }

    #[test]
    fn custom_alignment_applies() {
        let mut arena =
            OffsetAllocator::with_config(MockRuntime::new(), ArenaConfig::new(64)).unwrap();
        assert_eq!(arena.alloc(1).unwrap(), 0);
        assert_eq!(arena.alloc(65).unwrap(), 64);
        assert_eq!(arena.diagnostics().peak_bytes, 192);
        assert_eq!(arena.alignment(), 64);
    }

    #[test]
    fn zero_alignment_rejected() {
        let result = OffsetAllocator::with_config(MockRuntime::new(), ArenaConfig::new(0));
        assert!(matches!(result, Err(ArenaError::InvalidConfig { .. })));
    }

    #[test]
    fn oversized_request_returns_error_not_panic() {
        let mut arena = allocator();
        assert!(matches!(
            arena.alloc(usize::MAX),
            Err(ArenaError::SizeOverflow { .. })
        ));
        assert_eq!(arena.diagnostics(), ArenaStats::default());
    }

    #[test]
    fn fitting_hole_preferred_over_earlier_tail_hole() {
        let mut arena = allocator();
        let a = arena.alloc(40).unwrap();
        arena.alloc(8).unwrap();
        let c = arena.alloc(16).unwrap();
        let d = arena.alloc(8).unwrap();
        arena.free(c, 16).unwrap();
        arena.free(d, 8).unwrap();
        arena.free(a, 40).unwrap();
        // (48, 16) ends at the peak and is scanned before (0, 40).
        assert_eq!(arena.free_regions(), vec![(0, 40), (48, 16)]);
        assert_eq!(arena.diagnostics().peak_bytes, 64);

        assert_eq!(arena.alloc(32).unwrap(), 0);
        assert_eq!(arena.diagnostics().peak_bytes, 64);
        assert_eq!(arena.free_regions(), vec![(32, 8), (48, 16)]);
    }

    #[test]
    fn backing_is_cached_buffer() {
        let mut arena = allocator();
        arena.alloc(24).unwrap();
        assert!(arena.backing().is_none());
        let buffer = arena.materialize().unwrap().clone();
        assert_eq!(arena.backing(), Some(&buffer));
        assert_eq!(buffer.len, 24);
    }

    #[test]
    fn log_stats_has_no_side_effects() {
        let mut arena = allocator();
        let a = arena.alloc(8).unwrap();
        arena.alloc(16).unwrap();
        arena.free(a, 8).unwrap();
        let before = arena.diagnostics();
        arena.log_stats();
        assert_eq!(arena.diagnostics(), before);
        assert!(!arena.is_materialized());
    }

    #[test]
    fn stats_display() {
        let mut arena = allocator();
        let a = arena.alloc(8).unwrap();
        arena.alloc(8).unwrap();
        arena.free(a, 8).unwrap();
        assert_eq!(
            arena.diagnostics().to_string(),
            "used 16 bytes, peak 16 bytes, 1 free regions (8 bytes)"
        );
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Alloc(usize),
            /// Free the live reservation at this index (modulo live count).
            Free(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => (0usize..200).prop_map(Op::Alloc),
                2 => any::<usize>().prop_map(Op::Free),
            ]
        }

        proptest! {
            #[test]
            fn offsets_aligned_and_live_ranges_disjoint(
                ops in proptest::collection::vec(op(), 1..80),
            ) {
                let mut arena = allocator();
                let mut live: Vec<(usize, usize)> = Vec::new();
                for op in ops {
                    match op {
                        Op::Alloc(size) => {
                            let offset = arena.alloc(size).unwrap();
                            let len = ArenaConfig::default().aligned_size(size).unwrap();
                            prop_assert_eq!(offset % arena.alignment(), 0);
                            prop_assert!(offset + len <= arena.diagnostics().peak_bytes);
                            live.push((offset, size));
                        }
                        Op::Free(pick) => {
                            if live.is_empty() {
                                continue;
                            }
                            let (offset, size) = live.swap_remove(pick % live.len());
                            arena.free(offset, size).unwrap();
                        }
                    }
                    let mut ranges: Vec<(usize, usize)> = live
                        .iter()
                        .map(|&(o, s)| (o, ArenaConfig::default().aligned_size(s).unwrap()))
                        .collect();
                    ranges.sort_unstable();
                    for pair in ranges.windows(2) {
                        prop_assert!(pair[0].0 + pair[0].1 <= pair[1].0);
                    }
                }
            }

            #[test]
            fn free_regions_stay_coalesced_and_below_peak(
                ops in proptest::collection::vec(op(), 1..80),
            ) {
                let mut arena = allocator();
                let mut live: Vec<(usize, usize)> = Vec::new();
                for op in ops {
                    match op {
                        Op::Alloc(size) => live.push((arena.alloc(size).unwrap(), size)),
                        Op::Free(pick) => {
                            if live.is_empty() {
                                continue;
                            }
                            let (offset, size) = live.swap_remove(pick % live.len());
                            arena.free(offset, size).unwrap();
                        }
                    }
                    let holes = arena.free_regions();
                    for pair in holes.windows(2) {
                        prop_assert!(pair[0].0 + pair[0].1 < pair[1].0);
                    }
                    if let Some(&(start, len)) = holes.last() {
                        prop_assert!(start + len <= arena.diagnostics().peak_bytes);
                    }
                }
            }

            #[test]
            fn freeing_everything_in_reverse_empties_arena(
                sizes in proptest::collection::vec(0usize..256, 1..40),
            ) {
                let mut arena = allocator();
                let offsets: Vec<usize> = sizes.iter().map(|&s| arena.alloc(s).unwrap()).collect();
                for (&offset, &size) in offsets.iter().zip(&sizes).rev() {
                    arena.free(offset, size).unwrap();
                }
                prop_assert_eq!(arena.diagnostics().peak_bytes, 0);
                prop_assert!(arena.free_regions().is_empty());
            }
        }
    }
}
