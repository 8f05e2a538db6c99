//! Free-region bookkeeping with coalescing.
//!
//! [`FreeRegions`] records the holes left behind by freed allocations as
//! `start -> len` entries. Holes are disjoint, lie below the arena's peak,
//! and are never adjacent to one another: [`FreeRegions::release`] merges
//! a freed range with its neighbours before recording it.

use indexmap::IndexMap;

/// Outcome of a first-fit scan over the free regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fit {
    /// A hole at least as large as the request.
    Region {
        /// Start of the hole.
        start: usize,
        /// Its full length (may exceed the request).
        len: usize,
    },
    /// No hole is large enough, but this one ends exactly at the peak and
    /// can be extended by growing the arena.
    Tail {
        /// Start of the hole.
        start: usize,
        /// Its length (smaller than the request).
        len: usize,
    },
    /// Nothing reusable; append at the peak.
    None,
}

/// Set of free byte ranges inside an arena, keyed by start offset.
///
/// Scan order is the map's internal order, which depends on the history
/// of inserts and removals. First-fit picks the first sufficiently large
/// hole in that order; callers must not assume any particular tie-break
/// between equally suitable holes.
#[derive(Clone, Debug, Default)]
pub struct FreeRegions {
    regions: IndexMap<usize, usize>,
}

impl FreeRegions {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            regions: IndexMap::new(),
        }
    }

    /// Scan for a hole that can serve `size` bytes.
    ///
    /// Returns the first hole of at least `size` bytes. If there is none,
    /// reports the hole ending at `peak` (if any) so the caller can grow
    /// the arena by only the shortfall.
    pub fn first_fit(&self, size: usize, peak: usize) -> Fit {
        let mut tail = None;
        for (&start, &len) in &self.regions {
            if len >= size {
                return Fit::Region { start, len };
            }
            if start + len == peak {
                tail = Some((start, len));
            }
        }
        match tail {
            Some((start, len)) => Fit::Tail { start, len },
            None => Fit::None,
        }
    }

    /// Remove the hole starting at `start`, returning its length.
    pub fn take(&mut self, start: usize) -> Option<usize> {
        self.regions.swap_remove(&start)
    }

    /// Record a hole without coalescing.
    ///
    /// The caller guarantees the range is disjoint from, and not adjacent
    /// to, every recorded hole.
    pub fn insert(&mut self, start: usize, len: usize) {
        debug_assert!(len > 0, "empty free region at {start}");
        self.regions.insert(start, len);
    }

    /// Record `[offset, offset + len)` as free, merging it with the hole
    /// that ends at `offset` and the hole that starts at `offset + len`.
    ///
    /// Neighbours are located in one read-only scan and removed afterwards.
    /// Returns the merged `(start, len)` that was recorded.
    pub fn release(&mut self, offset: usize, len: usize) -> (usize, usize) {
        let end = offset + len;
        let mut predecessor = None;
        let mut successor = None;
        for (&start, &region_len) in &self.regions {
            if start + region_len == offset {
                predecessor = Some((start, region_len));
            } else if start == end {
                successor = Some(region_len);
            }
        }

        let mut merged_start = offset;
        let mut merged_len = len;
        if let Some((start, region_len)) = predecessor {
            self.regions.swap_remove(&start);
            merged_start = start;
            merged_len += region_len;
        }
        if let Some(region_len) = successor {
            self.regions.swap_remove(&end);
            merged_len += region_len;
        }
        self.regions.insert(merged_start, merged_len);
        (merged_start, merged_len)
    }

    /// Number of recorded holes.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether there are no holes.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total bytes across all holes.
    pub fn total_bytes(&self) -> usize {
        self.regions.values().sum()
    }

    /// Length of the hole starting at `start`, if one does.
    pub fn get(&self, start: usize) -> Option<usize> {
        self.regions.get(&start).copied()
    }

    /// All holes as `(start, len)`, sorted by start.
    pub fn sorted(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<_> = self.regions.iter().map(|(&s, &l)| (s, l)).collect();
        out.sort_unstable();
        out
    }

    /// Whether every hole is disjoint from and non-adjacent to the others.
    pub fn is_coalesced(&self) -> bool {
        self.sorted()
            .windows(2)
            .all(|pair| pair[0].0 + pair[0].1 < pair[1].0)
    }
}
