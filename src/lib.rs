//! A fixed-arena, two-class bitmap block allocator for long-running
//! applications (embedded control loops, network daemons, realtime tasks)
//! that must allocate and free small objects forever without invoking the
//! kernel allocator past initialization and without accumulating unbounded
//! fragmentation.
//!
//! This crate provides a single type, [`Mblib`], holding two independent
//! **spaces**: SMALL (16-byte units, requests up to 128 bytes) and BIG
//! (256-byte units, requests up to 2048 bytes). A request larger than 2048
//! bytes always fails. There is no per-allocation header: instead, each
//! space owns an **occupancy map** of 32-bit words, one nibble (4 bits) per
//! unit, and the length of a live allocation is recovered from the map
//! alone when it is freed.
//!
//! # Usage
//! ```
//! # #[cfg(feature = "std")] {
//! use mblib::Mblib;
//!
//! let arena = Mblib::new(2, 1); // 2048 SMALL units, 1024 BIG units
//! let handle = arena.alloc(48).unwrap();
//! arena.write(&handle, b"hello");
//! let mut out = [0u8; 5];
//! arena.read(&handle, &mut out);
//! assert_eq!(&out, b"hello");
//! arena.free(handle);
//! assert!(arena.test_free());
//! # }
//! ```
//!
//! For `#![no_std]` targets without a global allocator, back the arena with
//! caller-owned static storage instead of [`Mblib::new`]'s heap allocation:
//! ```
//! static mut BUFFER: [u32; 1024] = [0; 1024];
//! # fn pick_sizes() -> (usize, usize) { (1, 0) }
//! // let arena = mblib::Mblib::with_buffer(unsafe { &mut BUFFER }, 1, 0);
//! ```
//!
//! # Implementation
//! Each map word describes 8 consecutive units with one nibble each:
//! - `0x0`: free.
//! - `0x1`: the end-marker, the rightmost unit of a run (a length-1 run is
//!   just an end-marker with nothing before it).
//! - `0xF`: a continuation, a non-terminal unit of a run of length >= 2.
//!
//! A run of length `k` is encoded as `k - 1` continuations followed by one
//! end-marker, and never spans a word boundary:
//! ```text
//! length 1 at slot 0:    1 0 0 0 0 0 0 0
//! length 3 at slot 2:    0 0 F F 1 0 0 0
//! length 8 (whole word): F F F F F F F 1
//! ```
//! Confining every run to one word makes the encoding self-delimiting (any
//! run can be decoded by reading at most 8 nibbles, with no lookahead into
//! the next word) and bounds the worst-case scan cost per word to a
//! constant, at the cost of never coalescing across word boundaries.
//!
//! `alloc(n)` picks the smallest space whose word covers `n` bytes, then
//! scans that space's map starting at a per-space rotating cursor (a steady
//! -state workload stays near the front of the searched region instead of
//! re-scanning filled prefixes on every call) for a word with a free run of
//! `ceil(n / unit_size)` units, stamps it, and returns a handle to the
//! payload bytes. `free` walks the map starting at the freed slot until it
//! finds the end-marker to recover the run's length, then clears those
//! nibbles. Freeing the same handle twice is not possible at the type
//! level (see [`BlockHandle`]), but the underlying raw-pointer surface
//! detects a double free dynamically: the second walk reads a `0` at the
//! start slot, never finds a `1`, runs off the end of the word, and reports
//! [`Error::MapCorrupt`].
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(any(feature = "std", test))]
extern crate alloc;

mod arena;
mod backend;
mod dump;
mod error;
mod handle;
mod map;
mod space;
mod stats;

pub use error::{Error, LAST};
pub use handle::BlockHandle;
pub use space::SpaceId;
pub use stats::Stats;

use arena::Arena;
use backend::Backing;
use spin::Mutex;

/// The allocator. Owns both spaces behind a [`spin::Mutex`], so a single
/// `Mblib` value can be shared across threads (or dropped in as
/// `#[global_allocator]` under the `global` feature): the mutex turns a
/// single-mutator core `Sync`, which is what `GlobalAlloc` requires.
///
/// The core scan/free/stats algorithm itself (in [`arena::Arena`]) assumes a
/// single mutating caller and contains no locking of its own; `Mblib` is
/// purely the ambient synchronization layer around it.
pub struct Mblib {
    inner: Mutex<Arena>,
}

impl Mblib {
    /// Creates a new arena with `k_small * 1024` SMALL units and
    /// `k_big * 1024` BIG units, backed by a fresh heap allocation acquired
    /// once here and released once on drop.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn new(k_small: usize, k_big: usize) -> Self {
        let small_units = k_small * 1024;
        let big_units = k_big * 1024;
        let len = Arena::layout_len(small_units, big_units);
        let storage = Backing::owned(len);
        Self {
            inner: Mutex::new(Arena::new(storage, small_units, big_units)),
        }
    }

    /// Creates a new arena over caller-owned `'static` storage instead of
    /// the global allocator, for `#![no_std]` embedded callers.
    ///
    /// `buffer` is a `u32` slice so every map word and payload unit lands
    /// naturally aligned. Its length in bytes (`buffer.len() * 4`) must be
    /// at least as large as the layout `init` would have computed for
    /// `k_small`/`k_big`.
    ///
    /// # Panics
    /// Panics if `buffer` is too small for the requested `k_small`/`k_big`.
    pub fn with_buffer(buffer: &'static mut [u32], k_small: usize, k_big: usize) -> Self {
        let small_units = k_small * 1024;
        let big_units = k_big * 1024;
        let needed = Arena::layout_len(small_units, big_units);
        assert!(
            buffer.len() * 4 >= needed,
            "buffer too small: need {needed} bytes, got {}",
            buffer.len() * 4
        );
        let storage = Backing::borrowed(buffer);
        Self {
            inner: Mutex::new(Arena::new(storage, small_units, big_units)),
        }
    }

    /// Allocates `n` bytes. `n == 0` or `n > 2048` fails with
    /// [`Error::TooBig`]; no free slot in the selected space fails with
    /// [`Error::NoMem`].
    pub fn alloc(&self, n: usize) -> Result<BlockHandle, Error> {
        self.inner.lock().alloc(n)
    }

    /// Frees a handle previously returned by [`Self::alloc`] on this arena.
    pub fn free(&self, handle: BlockHandle) {
        let _ = self.inner.lock().free(handle);
    }

    /// Copies `data` into the handle's payload bytes (truncated to the
    /// shorter of `data.len()` and the handle's rounded-up size).
    pub fn write(&self, handle: &BlockHandle, data: &[u8]) {
        self.inner.lock().write(handle, data);
    }

    /// Copies the handle's payload bytes into `out` (truncated the same way
    /// as [`Self::write`]).
    pub fn read(&self, handle: &BlockHandle, out: &mut [u8]) {
        self.inner.lock().read(handle, out);
    }

    /// Run-length histograms for both spaces (`stats_get`).
    pub fn stats(&self) -> Stats {
        self.inner.lock().stats()
    }

    /// `true` iff every map word in both spaces is zero.
    pub fn test_free(&self) -> bool {
        self.inner.lock().test_free()
    }

    /// The last sticky error set by a mutating operation on this arena.
    pub fn err(&self) -> Error {
        self.inner.lock().err()
    }

    /// Prints the `dump_map` diagnostic to stdout.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn dump_map(&self) {
        dump::dump_map_to_stdout(&self.inner.lock());
    }

    /// Prints the `dump_stat` diagnostic to stdout.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn dump_stat(&self) {
        dump::dump_stat_to_stdout(&self.stats());
    }
}

#[cfg(feature = "global")]
#[cfg_attr(docsrs, doc(cfg(feature = "global")))]
mod global_alloc {
    use super::*;
    use core::alloc::{GlobalAlloc, Layout};

    /// `unsafe impl GlobalAlloc for Mblib` lets the same two-class arena be
    /// dropped in as `#[global_allocator]`. Requests that exceed 2048 bytes,
    /// or that need alignment this arena cannot honor (its units are
    /// 16/256-byte aligned; nothing demands a coarser alignment succeeds),
    /// return a null pointer.
    unsafe impl GlobalAlloc for Mblib {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let size = layout.size().max(layout.align());
            let mut arena = self.inner.lock();
            match arena.alloc(size) {
                Ok(handle) => {
                    let ptr = arena.handle_ptr(&handle);
                    core::mem::forget(handle);
                    ptr
                }
                Err(_) => core::ptr::null_mut(),
            }
        }

        unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
            let mut arena = self.inner.lock();
            let base = arena.base_ptr() as usize;
            match arena.locate(base, ptr as usize) {
                Some((id, mi, slot)) => {
                    let _ = arena.free_at(id, mi, slot);
                }
                None => arena.set_error(Error::UnknownPointer),
            }
        }
    }
}

/// The raw, C-shaped global surface, layered as a thin adapter over a
/// module-scoped [`Mblib`] singleton, the usual `static ALLOCATOR: Mblib`
/// shape a `#[global_allocator]` crate is built around. Only available
/// under the `std` feature, since `init`'s bulk acquisition is the global
/// allocator here; `#![no_std]` callers use [`Mblib::with_buffer`] directly
/// instead of this singleton.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod singleton {
    use super::*;

    static INSTANCE: Mutex<Option<Arena>> = Mutex::new(None);

    /// `init(k_small, k_big)`: one-shot setup. Repeated calls without an
    /// intervening [`term`] are undefined behavior; this
    /// implementation simply replaces the previous arena, dropping it.
    pub fn init(k_small: usize, k_big: usize) {
        let small_units = k_small * 1024;
        let big_units = k_big * 1024;
        let len = Arena::layout_len(small_units, big_units);
        let storage = Backing::owned(len);
        *INSTANCE.lock() = Some(Arena::new(storage, small_units, big_units));
    }

    /// `term()`: releases the arena. No operation is defined afterwards
    /// until the next [`init`].
    pub fn term() {
        *INSTANCE.lock() = None;
    }

    /// `alloc(n) -> pointer | null`.
    ///
    /// # Panics
    /// Panics if called before [`init`].
    pub fn alloc(n: usize) -> *mut u8 {
        let mut guard = INSTANCE.lock();
        let arena = guard.as_mut().expect("mblib::singleton::init must run before alloc");
        match arena.alloc(n) {
            Ok(handle) => {
                let ptr = arena.handle_ptr(&handle);
                core::mem::forget(handle);
                ptr
            }
            Err(_) => core::ptr::null_mut(),
        }
    }

    /// `free(p)`: must have been returned by a prior [`alloc`] and not yet
    /// freed.
    ///
    /// # Panics
    /// Panics if called before [`init`].
    pub fn free(p: *mut u8) {
        let mut guard = INSTANCE.lock();
        let arena = guard.as_mut().expect("mblib::singleton::init must run before free");
        let base = arena.base_ptr() as usize;
        match arena.locate(base, p as usize) {
            Some((id, mi, slot)) => {
                let _ = arena.free_at(id, mi, slot);
            }
            None => arena.set_error(Error::UnknownPointer),
        }
    }

    /// `err() -> code`: the last sticky error.
    pub fn err() -> Error {
        INSTANCE.lock().as_ref().map_or(Error::Ok, |a| a.err())
    }

    /// `err_str(code) -> string | null`.
    pub fn err_str(code: u8) -> Option<&'static str> {
        Error::str_for_ordinal(code)
    }

    /// `stats_get() -> Stats`: run-length histograms for both spaces.
    /// Returns a zeroed [`Stats`] and sets [`Error::MapCorrupt`] on an
    /// encoding violation, matching the raw surface's "returns 0 and sets
    /// MAP_CORRUPT" contract with an owned return value in place of the raw
    /// out-pointer.
    pub fn stats_get() -> Stats {
        INSTANCE.lock().as_mut().map_or_else(Stats::default, |a| a.stats())
    }

    /// `test_free() -> bool`.
    pub fn test_free() -> bool {
        match INSTANCE.lock().as_ref() {
            Some(arena) => arena.test_free(),
            None => true,
        }
    }

    /// `dump_map()`: prints the map diagnostic to stdout.
    pub fn dump_map() {
        if let Some(arena) = INSTANCE.lock().as_ref() {
            dump::dump_map_to_stdout(arena);
        }
    }

    /// `dump_stat()`: prints the stats diagnostic to stdout.
    pub fn dump_stat() {
        let stats = stats_get();
        dump::dump_stat_to_stdout(&stats);
    }
}
