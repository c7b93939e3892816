//! Constructor validation and trait-bound smoke tests: `#[should_panic]` on
//! bad construction parameters, plus an `assert::<T: Trait>` pattern for
//! trait-bound checks.
//!
//! Run with `--features std` (most tests construct an [`Mblib`] via the
//! heap-backed [`Mblib::new`]); the `with_buffer` tests work without it.

use mblib::{BlockHandle, Error, Mblib, LAST};

#[test]
#[should_panic(expected = "buffer too small")]
fn with_buffer_panics_if_too_small_for_requested_sizes() {
    static mut BUFFER: [u32; 4] = [0; 4];
    #[allow(static_mut_refs)]
    let _arena = Mblib::with_buffer(unsafe { &mut BUFFER }, 1, 1);
}

#[test]
fn with_buffer_succeeds_when_large_enough() {
    // k_small = k_big = 0 needs zero bytes of layout; any buffer qualifies.
    static mut BUFFER: [u32; 40] = [0; 40];
    #[allow(static_mut_refs)]
    let arena = Mblib::with_buffer(unsafe { &mut BUFFER }, 0, 0);
    // both spaces are empty (zero map words): the scan finds no word to
    // even try, so this is `NoMem`, never `TooBig`.
    assert_eq!(arena.alloc(16), Err(Error::NoMem));
}

#[cfg(feature = "global")]
#[test]
fn mblib_implements_global_alloc() {
    fn assert_global_alloc<T: core::alloc::GlobalAlloc>(_: &T) {}

    static mut BUFFER: [u32; 64] = [0; 64];
    #[allow(static_mut_refs)]
    let arena = Mblib::with_buffer(unsafe { &mut BUFFER }, 0, 0);
    assert_global_alloc(&arena);
}

#[test]
fn error_ordinals_are_stable() {
    assert_eq!(Error::Ok as u8, 0);
    assert_eq!(Error::NoMem as u8, 1);
    assert_eq!(Error::TooBig as u8, 2);
    assert_eq!(Error::UnknownPointer as u8, 3);
    assert_eq!(Error::MapCorrupt as u8, 4);
    assert_eq!(LAST, 5);
}

#[test]
fn err_str_is_positional_and_out_of_range_is_none() {
    assert_eq!(Error::str_for_ordinal(0), Some("OK"));
    assert_eq!(Error::str_for_ordinal(LAST), None);
}

#[test]
#[cfg(feature = "std")]
fn alloc_returns_a_handle_whose_len_is_rounded_up() {
    let arena = Mblib::new(1, 1);
    let handle: BlockHandle = arena.alloc(5).unwrap();
    assert_eq!(handle.len(), 16); // ceil(5/16) * 16
    arena.free(handle);
}
