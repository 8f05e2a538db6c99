//! Test utilities and mock types for Tessel development.
//!
//! Provides [`MockRuntime`], an in-memory implementation of the
//! [`Runtime`] collaborator that records every call, and shape
//! fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use tessel_core::{BufferId, Runtime, RuntimeError};

/// Buffer handle returned by [`MockRuntime`].
///
/// Carries no memory, only the id and the requested length so tests can
/// check what the allocator asked for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MockBuffer {
    pub id: BufferId,
    pub len: usize,
}

/// Mock implementation of [`Runtime`].
///
/// Counts `alloc`/`dealloc` calls and tracks live buffers. Releasing a
/// buffer that is not live panics, which turns double-frees in the code
/// under test into test failures. Share it with the allocator through an
/// `Arc` or a reference and inspect it afterwards.
pub struct MockRuntime {
    next_id: AtomicU64,
    alloc_calls: AtomicUsize,
    dealloc_calls: AtomicUsize,
    requests: Mutex<Vec<usize>>,
    live: Mutex<HashSet<BufferId>>,
    fail_with: Option<String>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            alloc_calls: AtomicUsize::new(0),
            dealloc_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            live: Mutex::new(HashSet::new()),
            fail_with: None,
        }
    }

    /// A runtime whose every `alloc` fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Number of `alloc` calls so far, including failed ones.
    pub fn alloc_calls(&self) -> usize {
        self.alloc_calls.load(Ordering::Relaxed)
    }

    /// Number of `dealloc` calls so far.
    pub fn dealloc_calls(&self) -> usize {
        self.dealloc_calls.load(Ordering::Relaxed)
    }

    /// Byte counts passed to `alloc`, in call order.
    pub fn requests(&self) -> Vec<usize> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of buffers handed out and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for MockRuntime {
    type Buffer = MockBuffer;

    fn alloc(&self, nbytes: usize) -> Result<MockBuffer, RuntimeError> {
        self.alloc_calls.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().unwrap().push(nbytes);
        if let Some(reason) = &self.fail_with {
            return Err(RuntimeError::new(reason.clone()));
        }
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live.lock().unwrap().insert(id);
        Ok(MockBuffer { id, len: nbytes })
    }

    fn dealloc(&self, buffer: MockBuffer) {
        self.dealloc_calls.fetch_add(1, Ordering::Relaxed);
        let was_live = self.live.lock().unwrap().remove(&buffer.id);
        assert!(was_live, "dealloc of buffer {} that is not live", buffer.id);
    }
}
