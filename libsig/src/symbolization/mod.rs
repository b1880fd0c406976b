//! # Symbols: Interning and Name Resolution
//!
//! Every transition the tracker records points at a code address. This
//! module keeps one canonical record per address and attaches a
//! human-readable name to it.
//!
//! ## Where Names Come From
//!
//! ```text
//! 1. Bootstrap file (eager, at startup)
//!    0x401126,init_fn   → pool.intern(0x401126).name = "init_fn"
//!
//! 2. Host resolution (lazy, first transition into an address)
//!    host.resolve_symbol_name(0x7f..e2b0) → Some("malloc") | None
//!
//! 3. Unknown marker
//!    None from the host is remembered so the host is never asked twice;
//!    the records file shows "???" for it.
//! ```
//!
//! ## Module Structure
//!
//! - **`pool`**: chained hash table of unique symbols (`SymbolPool`)
//! - **`bootstrap`**: reader/writer for `address,name` files
//! - **`symbolizer`**: DWARF + ELF symbol table name lookup for one binary,
//!   used by the replay host
//! - **`memory_maps`**: locating the main image's code segment from a
//!   `/proc/<pid>/maps` snapshot or the ELF `.text` section
//!
//! ## PIE Adjustment
//!
//! Runtime addresses inside the main image are translated to file-relative
//! addresses before symbolization:
//!
//! ```text
//! File Offset = Runtime Address - Image Start
//! ```
//!
//! Addresses outside the image belong to shared libraries, which the replay
//! symbolizer does not load.

pub mod bootstrap;
pub mod memory_maps;
pub mod pool;
pub mod symbolizer;

pub use bootstrap::{load_symbol_names, parse_symbol_line, write_symbol_names};
pub use memory_maps::{parse_memory_maps, read_memory_maps, text_section, ImageLayout, MemoryRange};
pub use pool::{SymbolHandle, SymbolName, SymbolPool};
pub use symbolizer::{ElfSymbol, Symbolizer};
