//! Collaborator traits implemented outside this workspace.

use std::rc::Rc;
use std::sync::Arc;

use crate::error::RuntimeError;

/// A device runtime that owns physical memory.
///
/// The arena allocator asks the runtime for exactly one buffer, sized to
/// the arena's final extent, and returns it exactly once on teardown.
/// Implementations take `&self`: a runtime is typically shared between
/// several arenas and tracks its own bookkeeping internally.
pub trait Runtime {
    /// Handle to a physical buffer.
    type Buffer;

    /// Allocate a buffer of `nbytes` bytes.
    fn alloc(&self, nbytes: usize) -> Result<Self::Buffer, RuntimeError>;

    /// Release a buffer previously returned by [`Runtime::alloc`].
    fn dealloc(&self, buffer: Self::Buffer);
}

impl<R: Runtime + ?Sized> Runtime for &R {
    type Buffer = R::Buffer;

    fn alloc(&self, nbytes: usize) -> Result<Self::Buffer, RuntimeError> {
        (**self).alloc(nbytes)
    }

    fn dealloc(&self, buffer: Self::Buffer) {
        (**self).dealloc(buffer)
    }
}

impl<R: Runtime + ?Sized> Runtime for Rc<R> {
    type Buffer = R::Buffer;

    fn alloc(&self, nbytes: usize) -> Result<Self::Buffer, RuntimeError> {
        (**self).alloc(nbytes)
    }

    fn dealloc(&self, buffer: Self::Buffer) {
        (**self).dealloc(buffer)
    }
}

impl<R: Runtime + ?Sized> Runtime for Arc<R> {
    type Buffer = R::Buffer;

    fn alloc(&self, nbytes: usize) -> Result<Self::Buffer, RuntimeError> {
        (**self).alloc(nbytes)
    }

    fn dealloc(&self, buffer: Self::Buffer) {
        (**self).dealloc(buffer)
    }
}
