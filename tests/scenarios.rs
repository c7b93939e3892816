//! Black-box integration tests for §8 "Concrete scenarios", exercised as
//! whole-crate behavior rather than against individual internals.
//!
//! Run with `--features std`.

#![cfg(feature = "std")]

use mblib::{singleton, BlockHandle, Error, Mblib};
use std::sync::Mutex;

/// `mblib::singleton` is one process-wide instance; cargo runs `#[test]`
/// functions within a file on separate threads by default, so every test
/// touching it must hold this lock for its duration or two tests' `init`
/// calls race each other.
static SINGLETON_TEST_LOCK: Mutex<()> = Mutex::new(());

/// Scenario 1: basic write/verify/free across a mix of sizes, including a
/// threshold crossing into BIG and an over-the-limit `TooBig`.
#[test]
fn basic_write_verify_free() {
    let arena = Mblib::new(2, 1);
    let sizes = [
        128usize, 64, 48, 48, 64, 128, 16, 64, 48, 128, 48, 48, 64, 64, 80, 80, 256, 300, 129, 9000,
    ];

    let mut handles: Vec<BlockHandle> = Vec::new();
    for &size in &sizes {
        if size == 9000 {
            assert_eq!(arena.alloc(size), Err(Error::TooBig));
            continue;
        }
        let handle = arena.alloc(size).unwrap();
        if size == 300 {
            assert_eq!(handle.len(), 512);
        }
        if size == 129 {
            assert_eq!(handle.len(), 256);
        }
        let pattern: Vec<u8> = (0..size)
            .map(|i| ((size as isize - i as isize).rem_euclid(100)) as u8)
            .collect();
        arena.write(&handle, &pattern);
        let mut readback = vec![0u8; size];
        arena.read(&handle, &mut readback);
        assert_eq!(readback, pattern);
        handles.push(handle);
    }

    for handle in handles {
        arena.free(handle);
    }
    assert!(arena.test_free());
}

/// Scenario 2: saturate the SMALL space exactly, then observe `NoMem`.
#[test]
fn saturate_smallest() {
    let arena = Mblib::new(2, 1);
    let mut handles = Vec::new();
    for _ in 0..2048 {
        handles.push(arena.alloc(16).unwrap());
    }
    assert_eq!(arena.alloc(16), Err(Error::NoMem));

    for handle in handles {
        arena.free(handle);
    }
    assert!(arena.test_free());
}

/// Scenario 3: fill both spaces to exhaustion with varied sizes, then probe
/// decreasing sizes until nothing more fits. Every allocation is eventually
/// freed and the arena returns to fully free.
#[test]
fn mixed_fill_to_full() {
    let arena = Mblib::new(2, 1);
    let mut handles = Vec::new();

    let mut i = 0usize;
    loop {
        let size = 16 * ((i % 8) + 1);
        match arena.alloc(size) {
            Ok(handle) => handles.push(handle),
            Err(Error::NoMem) => break,
            Err(e) => panic!("unexpected error {e}"),
        }
        i += 1;
    }

    let mut i = 0usize;
    loop {
        let size = 256 * ((i % 8) + 1);
        match arena.alloc(size) {
            Ok(handle) => handles.push(handle),
            Err(Error::NoMem) => break,
            Err(e) => panic!("unexpected error {e}"),
        }
        i += 1;
    }

    let mut cursize = 2048usize;
    while cursize > 0 {
        match arena.alloc(cursize) {
            Ok(handle) => handles.push(handle),
            Err(Error::NoMem) => cursize -= 256,
            Err(e) => panic!("unexpected error {e}"),
        }
    }
    let mut cursize = 128usize;
    while cursize > 0 {
        match arena.alloc(cursize) {
            Ok(handle) => handles.push(handle),
            Err(Error::NoMem) => cursize -= 16,
            Err(e) => panic!("unexpected error {e}"),
        }
    }

    for handle in handles {
        arena.free(handle);
    }
    assert!(arena.test_free());
}

/// Scenario 4: fragmentation is visible in stats, and disappears once the
/// fragmenting allocation is freed.
#[test]
fn fragmentation_visible_in_stats() {
    let arena = Mblib::new(1, 1);
    let a = arena.alloc(16).unwrap();
    let b = arena.alloc(48).unwrap(); // length-3 run
    let c = arena.alloc(16).unwrap();

    let stats = arena.stats();
    assert_eq!(stats.small[0], 2); // two length-1 runs (a, c)
    assert_eq!(stats.small[2], 1); // one length-3 run (b)

    arena.free(b);
    let stats = arena.stats();
    assert_eq!(stats.small[0], 2);
    assert_eq!(stats.small[2], 0);

    arena.free(a);
    arena.free(c);
    assert!(arena.test_free());
}

/// Scenario 5: freeing a foreign (stack) address sets `UnknownPointer` and
/// leaves the map untouched.
#[test]
fn foreign_pointer_is_unknown() {
    let _guard = SINGLETON_TEST_LOCK.lock().unwrap();
    singleton::init(1, 1);
    let handle = singleton::alloc(16);
    assert!(!handle.is_null());

    let stack_var: u32 = 0;
    singleton::free(core::ptr::addr_of!(stack_var) as *mut u8);
    assert_eq!(singleton::err(), Error::UnknownPointer);
    assert!(!singleton::test_free()); // the real allocation above is untouched

    singleton::free(handle);
    assert!(singleton::test_free());
    singleton::term();
}

/// Scenario 6: `term` then re-`init` starts from a fully free arena.
#[test]
fn term_then_reinit_round_trips() {
    let _guard = SINGLETON_TEST_LOCK.lock().unwrap();
    singleton::init(1, 1);
    let h1 = singleton::alloc(16);
    let h2 = singleton::alloc(256);
    assert!(!h1.is_null() && !h2.is_null());
    singleton::term();

    singleton::init(1, 1);
    assert!(singleton::test_free());
    singleton::term();
}

/// Double-freeing the same raw pointer is detected as `MapCorrupt` (P9).
#[test]
fn double_free_via_raw_pointer_is_map_corrupt() {
    let _guard = SINGLETON_TEST_LOCK.lock().unwrap();
    singleton::init(1, 1);
    let ptr = singleton::alloc(16);
    singleton::free(ptr);
    assert_eq!(singleton::err(), Error::Ok);
    singleton::free(ptr);
    assert_eq!(singleton::err(), Error::MapCorrupt);
    singleton::term();
}
