//! Offset planning for tensor arenas.
//!
//! A graph compiler walks its operators in execution order and asks an
//! [`OffsetAllocator`] for a byte offset per tensor, freeing each tensor
//! after its last use. The allocator reuses freed holes first-fit,
//! coalesces adjacent holes, and tracks the arena's peak extent. Once
//! planning is done, [`OffsetAllocator::materialize`] obtains a single
//! buffer of `peak` bytes from the device [`Runtime`](tessel_core::Runtime)
//! and the layout is frozen.
//!
//! # Architecture
//!
//! ```text
//! OffsetAllocator<R: Runtime>
//! ├── ArenaConfig (alignment)
//! ├── FreeRegions (start → len holes, IndexMap, always coalesced)
//! └── Backing<R::Buffer> (Pending | Materialized, released on drop)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backing;
pub mod config;
pub mod error;
pub mod free_list;
pub mod offset;

pub use backing::Backing;
pub use config::ArenaConfig;
pub use error::{ArenaError, ArenaOp};
pub use free_list::FreeRegions;
pub use offset::{ArenaStats, OffsetAllocator};
