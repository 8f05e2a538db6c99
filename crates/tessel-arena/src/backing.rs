//! Lazily acquired backing buffer.

/// State of an arena's physical memory.
///
/// An arena starts [`Pending`](Backing::Pending) and moves to
/// [`Materialized`](Backing::Materialized) once, when the buffer is
/// requested from the runtime. There is no transition back while the
/// arena lives; the layout is frozen from then on.
#[derive(Debug)]
pub enum Backing<B> {
    /// No physical memory yet; offsets may still be handed out and freed.
    Pending,
    /// The runtime's buffer, exclusively owned by the arena.
    Materialized(B),
}

impl<B> Default for Backing<B> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<B> Backing<B> {
    /// Whether the buffer has been acquired.
    pub fn is_materialized(&self) -> bool {
        matches!(self, Self::Materialized(_))
    }

    /// The buffer, if acquired.
    pub fn buffer(&self) -> Option<&B> {
        match self {
            Self::Materialized(buffer) => Some(buffer),
            Self::Pending => None,
        }
    }

    /// Acquire the buffer with `acquire` unless already materialized.
    ///
    /// `acquire` runs at most once over the lifetime of a successful
    /// materialization. If it fails the state stays `Pending`.
    pub fn get_or_try_materialize<E>(
        &mut self,
        acquire: impl FnOnce() -> Result<B, E>,
    ) -> Result<&B, E> {
        if let Self::Pending = self {
            *self = Self::Materialized(acquire()?);
        }
        match self {
            Self::Materialized(buffer) => Ok(buffer),
            Self::Pending => unreachable!("backing was materialized above"),
        }
    }

    /// Move the buffer out, leaving the state `Pending`.
    pub(crate) fn take(&mut self) -> Option<B> {
        match std::mem::take(self) {
            Self::Materialized(buffer) => Some(buffer),
            Self::Pending => None,
        }
    }
}
