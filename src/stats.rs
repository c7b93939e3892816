//! Owned statistics snapshot.
//!
//! The raw `stats_get(out_ptr)` surface hands back a library-owned
//! buffer pointer whose lifetime ends at the next call. Rust callers get an
//! owned value instead, sidestepping that borrow-lifetime question entirely.

/// Run-length histograms for both spaces, indexed by `run_length - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Counts for the SMALL space, `small[k-1]` is the number of live
    /// length-`k` runs.
    pub small: [u32; 8],
    /// Counts for the BIG space, same indexing.
    pub big: [u32; 8],
}

impl Stats {
    /// Total number of live allocations across both spaces.
    pub fn total(&self) -> u32 {
        self.small.iter().sum::<u32>() + self.big.iter().sum::<u32>()
    }
}
