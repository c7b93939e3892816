//! The host-provided bulk memory source: one allocation acquired at
//! construction and released at drop, exactly once, never touched by
//! `alloc`/`free` again.
//!
//! One allocation owns the raw bytes behind a runtime-sized region (the two
//! space sizes are `init`/`Mblib::new` parameters, not compile-time
//! constants), with a second, no_std-friendly constructor over
//! caller-owned `'static` storage for callers that never want this crate to
//! touch a global allocator at all.

/// Owner of the arena's single contiguous backing allocation.
///
/// The region is zeroed at construction (the whole region is zeroed before
/// use), which is also why this doesn't reach for `MaybeUninit`: a `MaybeUninit`
/// buffer pays for deferred initialization of bytes that would need a
/// non-zero header value written before being assumed-init, but every
/// nibble of a fresh map word legitimately *is* zero, so a plain zeroed byte
/// buffer is the more direct fit here.
pub enum Backing {
    /// Heap-owned storage, acquired once via the global allocator and
    /// released once on drop. Only available under the `std` feature.
    #[cfg(feature = "std")]
    Owned(alloc::boxed::Box<[u8]>),
    /// Caller-owned `'static` storage, for `#![no_std]` embedded callers that
    /// never want the arena to touch any allocator.
    Borrowed(&'static mut [u8]),
}

impl Backing {
    /// Acquires a fresh zeroed heap allocation of `len` bytes.
    #[cfg(feature = "std")]
    pub fn owned(len: usize) -> Self {
        Backing::Owned(alloc::vec![0u8; len].into_boxed_slice())
    }

    /// Wraps caller-provided static storage, zeroing it first.
    ///
    /// `buffer` is a `u32` slice rather than a byte slice so every map word
    /// and payload unit lands naturally aligned without a separate
    /// `#[repr(align(N))]` wrapper type.
    pub fn borrowed(buffer: &'static mut [u32]) -> Self {
        for word in buffer.iter_mut() {
            *word = 0;
        }
        // SAFETY: `u32` and `u8` have no padding and `[u32]` is at least as
        // aligned as `[u8]`, so reinterpreting the whole slice as bytes is
        // sound.
        let bytes: &'static mut [u8] = unsafe {
            core::slice::from_raw_parts_mut(buffer.as_mut_ptr().cast::<u8>(), buffer.len() * 4)
        };
        Backing::Borrowed(bytes)
    }

    pub fn len(&self) -> usize {
        self.as_ref().len()
    }

    pub fn as_ref(&self) -> &[u8] {
        match self {
            #[cfg(feature = "std")]
            Backing::Owned(b) => b,
            Backing::Borrowed(s) => s,
        }
    }

    pub fn as_mut(&mut self) -> &mut [u8] {
        match self {
            #[cfg(feature = "std")]
            Backing::Owned(b) => b,
            Backing::Borrowed(s) => s,
        }
    }
}
