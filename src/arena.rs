//! The library control block: both spaces plus the last sticky error code,
//! and the `alloc`/`free`/`stats`/`test_free` operations that mutate them.
//!
//! `Arena` is strictly single-mutator: no synchronization of its own. The
//! ambient `spin::Mutex<Arena>` wrapper that makes the crate's public
//! singleton surface thread-usable lives in `src/lib.rs` (`Mblib`).

use crate::backend::Backing;
use crate::error::Error;
use crate::handle::BlockHandle;
use crate::space::{Space, SpaceId};
use crate::stats::Stats;

const SLOTS_PER_WORD: usize = crate::map::SLOTS_PER_WORD as usize;

fn ceil_div(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}

/// Computes the per-space word/byte layout for a given unit count.
///
/// Applies the contiguous-allocation formula: `words * (4 + word_coverage)`
/// bytes per space, laid out as `map | payload`.
fn space_layout(units: usize, unit_size: u16) -> (usize, usize) {
    let words = units / SLOTS_PER_WORD;
    let word_coverage = unit_size as usize * SLOTS_PER_WORD;
    let bytes = words * (4 + word_coverage);
    (words, bytes)
}

/// The SMALL space's unit size in bytes.
pub const SMALL_UNIT: u16 = 16;
/// The BIG space's unit size in bytes.
pub const BIG_UNIT: u16 = 256;
/// Largest byte count any space can satisfy; a request past this is `TooBig`.
pub const MAX_REQUEST: usize = BIG_UNIT as usize * SLOTS_PER_WORD;

pub struct Arena {
    storage: Backing,
    small: Space,
    big: Space,
    error: Error,
}

impl Arena {
    /// Lays out and zeroes a fresh arena backed by `storage`, whose length
    /// must exactly equal the layout computed from `small_units`/`big_units`
    /// (both multiples of 8, since the word count is `units / 8`).
    pub(crate) fn new(storage: Backing, small_units: usize, big_units: usize) -> Self {
        let (small_words, small_bytes) = space_layout(small_units, SMALL_UNIT);
        let (big_words, big_bytes) = space_layout(big_units, BIG_UNIT);
        debug_assert_eq!(storage.len(), small_bytes + big_bytes);

        let small_map_offset = 0;
        let small_payload_offset = small_words * 4;
        let big_map_offset = small_bytes;
        let big_payload_offset = big_map_offset + big_words * 4;

        let small = Space::new(SMALL_UNIT, small_words, small_map_offset, small_payload_offset);
        let big = Space::new(BIG_UNIT, big_words, big_map_offset, big_payload_offset);

        Self {
            storage,
            small,
            big,
            error: Error::Ok,
        }
    }

    /// Total backing allocation size for `init(k_small, k_big)`.
    pub(crate) fn layout_len(small_units: usize, big_units: usize) -> usize {
        let (_, small_bytes) = space_layout(small_units, SMALL_UNIT);
        let (_, big_bytes) = space_layout(big_units, BIG_UNIT);
        small_bytes + big_bytes
    }

    fn space(&self, id: SpaceId) -> &Space {
        match id {
            SpaceId::Small => &self.small,
            SpaceId::Big => &self.big,
        }
    }

    /// Disjoint mutable borrows of one space's descriptor and the whole
    /// backing buffer, so `alloc`/`free` can mutate both without a method
    /// call on `self` reborrowing the other field.
    fn space_and_bytes_mut(&mut self, id: SpaceId) -> (&mut Space, &mut [u8]) {
        let Arena { small, big, storage, .. } = self;
        let space = match id {
            SpaceId::Small => small,
            SpaceId::Big => big,
        };
        (space, storage.as_mut())
    }

    /// Allocation: select the smallest fitting space, scan, stamp.
    pub fn alloc(&mut self, n: usize) -> Result<BlockHandle, Error> {
        if n == 0 || n > MAX_REQUEST {
            self.error = Error::TooBig;
            return Err(Error::TooBig);
        }

        for id in [SpaceId::Small, SpaceId::Big] {
            let word_coverage = self.space(id).word_coverage() as usize;
            if n > word_coverage {
                continue;
            }
            let unit_size = self.space(id).unit_size();
            let k = ceil_div(n, unit_size as usize).clamp(1, SLOTS_PER_WORD) as u8;
            let (space, bytes) = self.space_and_bytes_mut(id);
            return match space.alloc(bytes, k) {
                Some((mi, slot)) => {
                    self.error = Error::Ok;
                    Ok(BlockHandle::new(id, mi, slot, k, unit_size))
                }
                None => {
                    self.error = Error::NoMem;
                    Err(Error::NoMem)
                }
            };
        }

        self.error = Error::TooBig;
        Err(Error::TooBig)
    }

    /// Free: recover the run from the map and clear it.
    ///
    /// Handles obtained from [`Self::alloc`] always name a space/word/slot
    /// that existed at allocation time, so only [`Error::MapCorrupt`] (a
    /// double free, see the idempotence note on run recovery) can surface
    /// here; the raw `free(ptr)` boundary adapter (`src/lib.rs`) is where
    /// [`Error::UnknownPointer`] is detected, since only it deals in
    /// addresses outside both payload regions.
    pub fn free(&mut self, handle: BlockHandle) -> Result<(), Error> {
        self.free_at(handle.space(), handle.word_index(), handle.slot())
    }

    /// Frees by raw `(space, word, slot)` location, bypassing [`BlockHandle`].
    /// Used by the raw pointer-shaped `free(ptr)` boundary adapter, which
    /// recovers the location via [`Self::locate`] instead of holding a
    /// handle.
    pub(crate) fn free_at(&mut self, id: SpaceId, mi: usize, slot: u8) -> Result<(), Error> {
        let (space, bytes) = self.space_and_bytes_mut(id);
        match space.free(bytes, mi, slot) {
            Ok(_len) => {
                self.error = Error::Ok;
                Ok(())
            }
            Err(e) => {
                self.error = e;
                Err(e)
            }
        }
    }

    /// Copies `data` into the run's payload bytes, truncating to whichever
    /// of `data.len()`/the run's length is shorter.
    pub fn write(&mut self, handle: &BlockHandle, data: &[u8]) {
        let range = self
            .space(handle.space())
            .payload_range(handle.word_index(), handle.slot(), handle.units());
        let bytes = self.storage.as_mut();
        let len = range.len().min(data.len());
        bytes[range.start..range.start + len].copy_from_slice(&data[..len]);
    }

    /// Copies the run's payload bytes into `out`, truncating the same way
    /// as [`Self::write`].
    pub fn read(&self, handle: &BlockHandle, out: &mut [u8]) {
        let range = self
            .space(handle.space())
            .payload_range(handle.word_index(), handle.slot(), handle.units());
        let bytes = self.storage.as_ref();
        let len = range.len().min(out.len());
        out[..len].copy_from_slice(&bytes[range.start..range.start + len]);
    }

    /// Stats: run-length histograms for both spaces.
    pub fn stats(&mut self) -> Stats {
        let bytes = self.storage.as_ref();
        let mut small = [0u32; 8];
        let mut big = [0u32; 8];
        let result = self
            .small
            .stats_into(bytes, &mut small)
            .and_then(|()| self.big.stats_into(bytes, &mut big));
        match result {
            Ok(()) => {
                self.error = Error::Ok;
                Stats { small, big }
            }
            Err(e) => {
                self.error = e;
                Stats::default()
            }
        }
    }

    /// Test-free: every map word in both spaces is zero.
    pub fn test_free(&self) -> bool {
        let bytes = self.storage.as_ref();
        self.small.is_free(bytes) && self.big.is_free(bytes)
    }

    /// Last sticky error code.
    pub fn err(&self) -> Error {
        self.error
    }

    pub(crate) fn set_error(&mut self, error: Error) {
        self.error = error;
    }

    /// Identifies the space containing payload address `ptr` (as an
    /// absolute pointer value), for the raw `free(ptr)` boundary adapter.
    /// Returns the recovered `(space, word, slot)` or `None` if `ptr` is
    /// outside both payload regions.
    pub(crate) fn locate(&self, base: usize, ptr: usize) -> Option<(SpaceId, usize, u8)> {
        for id in [SpaceId::Small, SpaceId::Big] {
            let space = self.space(id);
            let payload_base = base + space.payload_offset();
            if ptr < payload_base {
                continue;
            }
            let offset = ptr - payload_base;
            if !space.contains_payload_offset(offset) {
                continue;
            }
            let word_coverage = space.word_coverage() as usize;
            let mi = offset / word_coverage;
            let slot = ((offset % word_coverage) / space.unit_size() as usize) as u8;
            return Some((id, mi, slot));
        }
        None
    }

    pub(crate) fn base_ptr(&self) -> *const u8 {
        self.storage.as_ref().as_ptr()
    }

    /// Raw payload pointer for a handle, for the `GlobalAlloc`/raw-surface
    /// boundary adapters. The handle is forgotten by the caller once it has
    /// converted ownership into a raw pointer, matching the C-shaped
    /// `alloc(n) -> pointer` contract of the raw surface.
    pub(crate) fn handle_ptr(&self, handle: &BlockHandle) -> *mut u8 {
        let range = self
            .space(handle.space())
            .payload_range(handle.word_index(), handle.slot(), handle.units());
        // SAFETY: `range.start` is within `storage`'s length by construction
        // (it came from a just-completed `alloc` on this same arena).
        unsafe { self.storage.as_ref().as_ptr().add(range.start) as *mut u8 }
    }

    pub(crate) fn space_for_dump(&self, id: SpaceId) -> &Space {
        self.space(id)
    }

    pub(crate) fn bytes_for_dump(&self) -> &[u8] {
        self.storage.as_ref()
    }
}
