//! Diagnostic dump helpers. Formats are not contractual, so consumers
//! compare against them only loosely, and these write into any
//! `core::fmt::Write` sink rather than assuming a `std::io::Stdout`, keeping
//! the crate usable from `#![no_std]` binaries. A `std`-only convenience
//! that writes straight to stdout is layered on top.

use crate::arena::Arena;
use crate::space::SpaceId;
use crate::stats::Stats;
use core::fmt::{self, Write};

/// Writes both maps as uppercase hex words, 8 per line, each preceded by a
/// section header.
pub fn dump_map(arena: &Arena, w: &mut impl Write) -> fmt::Result {
    writeln!(w, "-------- Small Block Map --------")?;
    write_words(arena, SpaceId::Small, w)?;
    writeln!(w, "-------- Big Block Map --------")?;
    write_words(arena, SpaceId::Big, w)?;
    Ok(())
}

fn write_words(arena: &Arena, id: SpaceId, w: &mut impl Write) -> fmt::Result {
    let space = arena.space_for_dump(id);
    let bytes = arena.bytes_for_dump();
    for mi in 0..space.map_words() {
        let word = space.word(bytes, mi);
        write!(w, "{word:08X}")?;
        if (mi + 1) % 8 == 0 {
            writeln!(w)?;
        } else {
            write!(w, " ")?;
        }
    }
    if space.map_words() % 8 != 0 {
        writeln!(w)?;
    }
    Ok(())
}

/// Writes the two stats rows (`-- small blocks : `, `--   big blocks : `),
/// each 8 six-digit zero-padded counters.
pub fn dump_stat(stats: &Stats, w: &mut impl Write) -> fmt::Result {
    write!(w, "-- small blocks : ")?;
    for count in stats.small {
        write!(w, "{count:06} ")?;
    }
    writeln!(w)?;
    write!(w, "--   big blocks : ")?;
    for count in stats.big {
        write!(w, "{count:06} ")?;
    }
    writeln!(w)?;
    Ok(())
}

#[cfg(feature = "std")]
mod std_convenience {
    use super::*;

    /// Prints [`dump_map`]'s output to stdout.
    pub fn dump_map_to_stdout(arena: &Arena) {
        let mut buf = alloc::string::String::new();
        let _ = dump_map(arena, &mut buf);
        print!("{buf}");
    }

    /// Prints [`dump_stat`]'s output to stdout.
    pub fn dump_stat_to_stdout(stats: &Stats) {
        let mut buf = alloc::string::String::new();
        let _ = dump_stat(stats, &mut buf);
        print!("{buf}");
    }
}

#[cfg(feature = "std")]
pub use std_convenience::{dump_map_to_stdout, dump_stat_to_stdout};
