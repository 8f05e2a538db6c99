//! Benchmark workloads for the Tessel arena allocator and shape rules.
//!
//! Provides deterministic allocation traces shaped like real graph
//! compiler output:
//!
//! - [`transformer_trace`]: per-layer activations of a decoder stack,
//!   freed roughly in reverse allocation order
//! - [`churn_trace`]: pseudo-random sizes with interleaved frees
//! - [`replay`]: drive an [`OffsetAllocator`] through a trace

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::error::Error;
use std::fmt;

use tessel_arena::{ArenaError, OffsetAllocator};
use tessel_core::{Runtime, Shape, ShapeError};
use tessel_shape::infer_matmul;

/// Errors from building or replaying a trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceError {
    /// The layer shapes are not a valid matrix product.
    Shape(ShapeError),
    /// A tensor's byte size does not fit in `usize`.
    SizeOverflow {
        /// Dimensions of the offending tensor.
        dims: Vec<usize>,
    },
    /// A free names a tensor that is not live.
    UnknownTensor {
        /// Tensor index within the trace.
        id: usize,
    },
    /// The allocator rejected a request.
    Arena(ArenaError),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(e) => write!(f, "invalid layer shapes: {e}"),
            Self::SizeOverflow { dims } => {
                write!(f, "byte size of tensor {dims:?} overflows usize")
            }
            Self::UnknownTensor { id } => write!(f, "free of tensor {id}, which is not live"),
            Self::Arena(e) => write!(f, "allocator error: {e}"),
        }
    }
}

impl Error for TraceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Shape(e) => Some(e),
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for TraceError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

impl From<ArenaError> for TraceError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

/// One allocator request in a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// Allocate tensor `id` with `bytes` bytes.
    Alloc {
        /// Tensor index within the trace.
        id: usize,
        /// Requested size.
        bytes: usize,
    },
    /// Free tensor `id`.
    Free {
        /// Tensor index within the trace.
        id: usize,
    },
}

/// Build a trace for `layers` decoder layers over a `[batch, seq, hidden]`
/// activation, using the matmul rule to size every projection.
///
/// Each layer allocates Q/K/V projections, attention scores, the attention
/// output, and an MLP hidden state, then frees them innermost first.
/// Fails if a tensor's byte size overflows.
pub fn transformer_trace(
    layers: usize,
    batch: usize,
    seq: usize,
    hidden: usize,
) -> Result<Vec<TraceEvent>, TraceError> {
    const F32: usize = 4;
    let x = [batch, seq, hidden];
    let w = [hidden, hidden];
    let up_width = hidden.checked_mul(4).ok_or_else(|| TraceError::SizeOverflow {
        dims: vec![hidden, hidden, 4],
    })?;
    let w_up = [hidden, up_width];

    let bytes_of = |shape: Shape| {
        shape.byte_len(F32).ok_or_else(|| TraceError::SizeOverflow {
            dims: shape.dims().to_vec(),
        })
    };
    let proj = bytes_of(infer_matmul(&x, &w, false, false)?)?;
    let scores = bytes_of(infer_matmul(&x, &x, false, true)?)?;
    let up = bytes_of(infer_matmul(&x, &w_up, false, false)?)?;

    let mut events = Vec::new();
    let mut next_id = 0usize;
    let mut alloc = |events: &mut Vec<TraceEvent>, bytes: usize| {
        let id = next_id;
        next_id += 1;
        events.push(TraceEvent::Alloc { id, bytes });
        id
    };

    let mut residual = alloc(&mut events, proj);
    for _ in 0..layers {
        let q = alloc(&mut events, proj);
        let k = alloc(&mut events, proj);
        let v = alloc(&mut events, proj);
        let s = alloc(&mut events, scores);
        events.push(TraceEvent::Free { id: k });
        events.push(TraceEvent::Free { id: q });
        let attn = alloc(&mut events, proj);
        events.push(TraceEvent::Free { id: s });
        events.push(TraceEvent::Free { id: v });
        let hidden_state = alloc(&mut events, up);
        let out = alloc(&mut events, proj);
        events.push(TraceEvent::Free { id: hidden_state });
        events.push(TraceEvent::Free { id: attn });
        events.push(TraceEvent::Free { id: residual });
        residual = out;
    }
    events.push(TraceEvent::Free { id: residual });
    Ok(events)
}

/// Build a trace of `n` allocations with pseudo-random sizes in
/// `[1, max_bytes]`, freeing an older live tensor after every second
/// allocation. Deterministic for a given `seed`.
pub fn churn_trace(n: usize, max_bytes: usize, seed: u64) -> Vec<TraceEvent> {
    let mut state = seed;
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };

    let mut events = Vec::with_capacity(2 * n);
    let mut live: Vec<usize> = Vec::new();
    for id in 0..n {
        let bytes = (next() as usize % max_bytes.max(1)) + 1;
        events.push(TraceEvent::Alloc { id, bytes });
        live.push(id);
        if id % 2 == 1 {
            let victim = live.swap_remove(next() as usize % live.len());
            events.push(TraceEvent::Free { id: victim });
        }
    }
    events
}

/// Replay `events` against `arena`. Returns the offset assigned to each
/// tensor id, indexed by id; ids the trace never allocates read as 0.
///
/// Freeing a tensor that was never allocated, or was already freed, fails
/// with [`TraceError::UnknownTensor`].
pub fn replay<R: Runtime>(
    arena: &mut OffsetAllocator<R>,
    events: &[TraceEvent],
) -> Result<Vec<usize>, TraceError> {
    let mut offsets: Vec<usize> = Vec::new();
    let mut live: Vec<Option<usize>> = Vec::new();
    for event in events {
        match *event {
            TraceEvent::Alloc { id, bytes } => {
                let offset = arena.alloc(bytes)?;
                if offsets.len() <= id {
                    offsets.resize(id + 1, 0);
                    live.resize(id + 1, None);
                }
                offsets[id] = offset;
                live[id] = Some(bytes);
            }
            TraceEvent::Free { id } => {
                let bytes = live
                    .get_mut(id)
                    .and_then(Option::take)
                    .ok_or(TraceError::UnknownTensor { id })?;
                arena.free(offsets[id], bytes)?;
            }
        }
    }
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_test_utils::MockRuntime;

    #[test]
    fn transformer_trace_releases_everything() {
        let events = transformer_trace(4, 2, 16, 64).unwrap();
        let mut arena = OffsetAllocator::new(MockRuntime::new());
        replay(&mut arena, &events).unwrap();
        // Nothing is live: whatever remains below the peak is one hole.
        let stats = arena.diagnostics();
        assert_eq!(stats.peak_bytes, stats.free_bytes);
        assert!(stats.free_region_count <= 1);
    }

    #[test]
    fn transformer_peak_stays_far_below_total_traffic() {
        let mut shallow = OffsetAllocator::new(MockRuntime::new());
        let mut deep = OffsetAllocator::new(MockRuntime::new());
        let shallow_events = transformer_trace(2, 2, 16, 64).unwrap();
        let deep_events = transformer_trace(12, 2, 16, 64).unwrap();
        // Stop before the final free so the peak reflects the steady state.
        replay(&mut shallow, &shallow_events[..shallow_events.len() - 1]).unwrap();
        replay(&mut deep, &deep_events[..deep_events.len() - 1]).unwrap();
        let shallow_used = shallow.diagnostics().used_bytes;
        let deep_used = deep.diagnostics().used_bytes;
        assert!(deep_used > shallow_used);
        assert!(deep.diagnostics().peak_bytes < deep_used / 4);
    }

    #[test]
    fn churn_trace_is_deterministic() {
        assert_eq!(churn_trace(50, 512, 42), churn_trace(50, 512, 42));
        assert_ne!(churn_trace(50, 512, 42), churn_trace(50, 512, 7));
    }

    #[test]
    fn churn_trace_replays_cleanly() {
        let events = churn_trace(200, 4096, 3);
        let mut arena = OffsetAllocator::new(MockRuntime::new());
        let offsets = replay(&mut arena, &events).unwrap();
        assert_eq!(offsets.len(), 200);
        assert!(offsets.iter().all(|o| o % arena.alignment() == 0));
    }

    #[test]
    fn oversized_layers_are_rejected() {
        assert!(matches!(
            transformer_trace(1, usize::MAX, 2, 2),
            Err(TraceError::SizeOverflow { .. })
        ));
        assert!(matches!(
            transformer_trace(1, 1, 1, usize::MAX),
            Err(TraceError::SizeOverflow { .. })
        ));
    }

    #[test]
    fn free_of_unallocated_tensor_is_reported() {
        let mut arena = OffsetAllocator::new(MockRuntime::new());
        let events = [
            TraceEvent::Alloc { id: 0, bytes: 8 },
            TraceEvent::Free { id: 3 },
        ];
        assert_eq!(
            replay(&mut arena, &events),
            Err(TraceError::UnknownTensor { id: 3 })
        );
    }

    #[test]
    fn double_free_in_trace_is_reported() {
        let mut arena = OffsetAllocator::new(MockRuntime::new());
        let events = [
            TraceEvent::Alloc { id: 0, bytes: 8 },
            TraceEvent::Alloc { id: 1, bytes: 8 },
            TraceEvent::Free { id: 0 },
            TraceEvent::Free { id: 0 },
        ];
        assert_eq!(
            replay(&mut arena, &events),
            Err(TraceError::UnknownTensor { id: 0 })
        );
        assert_eq!(arena.free_regions(), vec![(0, 8)]);
    }
}
