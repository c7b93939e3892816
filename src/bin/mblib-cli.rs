//! A small demo binary exercising [`mblib::Mblib`] end to end.
//!
//! This is a thin consumer of the public API (not a reimplementation of any
//! core logic): it parses a couple of flags by hand, runs one of the
//! "Concrete scenarios" the library's own test suite also exercises, and
//! prints the diagnostic dump formats plus a final `test_free()` result.
//! This library is primarily a `#[global_allocator]` plug-in rather than a
//! standalone tool; this binary fronts it with a small CLI for manual
//! exercising and diagnostics.

use mblib::Mblib;

fn main() {
    env_logger::init();

    let mut small_k = 2usize;
    let mut big_k = 1usize;
    let mut scenario = 1u8;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--small-k" => small_k = next_usize(&mut args, "--small-k"),
            "--big-k" => big_k = next_usize(&mut args, "--big-k"),
            "--scenario" => scenario = next_usize(&mut args, "--scenario") as u8,
            other => {
                eprintln!("unrecognized flag: {other}");
                std::process::exit(2);
            }
        }
    }

    log::info!("constructing arena: small_k={small_k}, big_k={big_k}");
    let arena = Mblib::new(small_k, big_k);

    match scenario {
        1 => basic_write_verify_free(&arena),
        2 => saturate_smallest(&arena, small_k),
        _ => {
            eprintln!("unknown --scenario {scenario}, running scenario 1");
            basic_write_verify_free(&arena);
        }
    }

    arena.dump_map();
    arena.dump_stat();
    println!("test_free() = {}", arena.test_free());
}

fn next_usize(args: &mut impl Iterator<Item = String>, flag: &str) -> usize {
    args.next()
        .unwrap_or_else(|| {
            eprintln!("{flag} requires a value");
            std::process::exit(2);
        })
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("{flag} expects an integer");
            std::process::exit(2);
        })
}

/// Allocate, fill with a pattern, read back, free in order.
fn basic_write_verify_free(arena: &Mblib) {
    let sizes = [
        128usize, 64, 48, 48, 64, 128, 16, 64, 48, 128, 48, 48, 64, 64, 80, 80, 256, 300, 129, 9000,
    ];
    let mut handles = Vec::new();
    for size in sizes {
        match arena.alloc(size) {
            Ok(handle) => {
                let pattern: Vec<u8> = (0..handle.len())
                    .map(|i| ((size as isize - i as isize).rem_euclid(100)) as u8)
                    .collect();
                arena.write(&handle, &pattern);
                let mut readback = vec![0u8; handle.len()];
                arena.read(&handle, &mut readback);
                assert_eq!(pattern, readback, "payload corrupted for size {size}");
                handles.push(handle);
            }
            Err(e) => {
                log::warn!("alloc({size}) failed: {e}");
            }
        }
    }
    for handle in handles {
        arena.free(handle);
    }
}

/// Saturate the SMALL space, observe `NoMem`.
fn saturate_smallest(arena: &Mblib, small_k: usize) {
    let mut handles = Vec::new();
    loop {
        match arena.alloc(16) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                log::info!("saturated SMALL after {} allocations: {e}", handles.len());
                break;
            }
        }
    }
    assert_eq!(handles.len(), small_k * 1024);
    for handle in handles {
        arena.free(handle);
    }
}
