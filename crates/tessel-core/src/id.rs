//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a physical buffer handed out by a [`Runtime`](crate::Runtime).
///
/// Runtimes are free to choose any numbering scheme; the only requirement
/// is that two live buffers from the same runtime never share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BufferId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
