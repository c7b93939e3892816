//! Owned handle to a live allocation, used by the safe facade instead of raw
//! pointers: indices are exposed rather than raw pointers wherever the
//! language permits.

use crate::space::SpaceId;

/// A validated `(space, word, slot)` triple identifying one live allocation.
///
/// `BlockHandle` is deliberately not `Copy`/`Clone`: [`crate::Mblib::free`]
/// consumes it by value, so a handle obtained through the safe facade cannot
/// be freed twice at the type level. The raw `free(ptr)` entry point
/// is kept separately and still detects a double-free dynamically via
/// [`crate::error::Error::MapCorrupt`], for callers working with raw
/// pointers instead of handles.
#[derive(Debug, PartialEq, Eq)]
pub struct BlockHandle {
    space: SpaceId,
    word: usize,
    slot: u8,
    units: u8,
    unit_size: u16,
}

impl BlockHandle {
    pub(crate) fn new(space: SpaceId, word: usize, slot: u8, units: u8, unit_size: u16) -> Self {
        Self {
            space,
            word,
            slot,
            units,
            unit_size,
        }
    }

    /// Which space this allocation lives in.
    pub fn space(&self) -> SpaceId {
        self.space
    }

    /// Size of the run in bytes (`units * unit_size`), i.e. the rounded-up
    /// size actually reserved, not the byte count originally requested.
    pub fn len(&self) -> usize {
        self.units as usize * self.unit_size as usize
    }

    /// `true` for a zero-length handle; never actually constructed by
    /// [`crate::Mblib::alloc`], since `alloc(0)` is rejected as `TooBig`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn word_index(&self) -> usize {
        self.word
    }

    pub(crate) fn slot(&self) -> u8 {
        self.slot
    }

    pub(crate) fn units(&self) -> u8 {
        self.units
    }
}
