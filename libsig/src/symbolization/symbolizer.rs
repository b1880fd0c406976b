use addr2line::Context;
use anyhow::{Context as _, Result};
use gimli::{EndianRcSlice, RunTimeEndian};
use object::{Object, ObjectSection, ObjectSymbol, SymbolKind};
use rustc_demangle::demangle;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Symbolizer for resolving code addresses of one binary to function names
///
/// DWARF debug info is consulted first (it knows about inlined functions);
/// the ELF symbol table is the fallback for binaries built without it.
/// Addresses are file-relative: callers adjust PIE runtime addresses first.
pub struct Symbolizer {
    ctx: Context<EndianRcSlice<RunTimeEndian>>,
    /// Function symbols sorted by start address
    symbols: Vec<ElfSymbol>,
}

/// A function symbol from the ELF symbol tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfSymbol {
    pub addr: u64,
    pub size: u64,
    pub name: String,
}

impl Symbolizer {
    /// Create a new symbolizer for the given binary
    ///
    /// # Errors
    /// Returns an error if the binary file cannot be read or parsed
    pub fn new<P: AsRef<Path>>(binary_path: P) -> Result<Self> {
        let binary_data = fs::read(binary_path.as_ref()).context("Failed to read binary file")?;

        let obj_file = object::File::parse(&*binary_data).context("Failed to parse object file")?;

        // Load DWARF debug info
        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
                Ok(EndianRcSlice::new(Rc::from(&*data), endian))
            };

        let dwarf = gimli::Dwarf::load(&load_section)?;
        let ctx = Context::from_dwarf(dwarf).context("Failed to load DWARF debug information")?;

        Ok(Self { ctx, symbols: function_symbols(&obj_file) })
    }

    /// Resolve a file-relative address to a demangled function name
    ///
    /// Returns `None` if neither DWARF nor the symbol table covers it.
    #[must_use]
    pub fn function_name(&self, addr: u64) -> Option<String> {
        self.dwarf_function(addr).or_else(|| self.symbol_function(addr))
    }

    /// Function symbols of the binary, sorted by address
    #[must_use]
    pub fn symbols(&self) -> &[ElfSymbol] {
        &self.symbols
    }

    /// Demangle a Rust symbol name (other names are returned unchanged)
    #[must_use]
    pub fn demangle_symbol(symbol: &str) -> String {
        format!("{:#}", demangle(symbol))
    }

    fn dwarf_function(&self, addr: u64) -> Option<String> {
        let mut frame_iter = self.ctx.find_frames(addr).skip_all_loads().ok()?;

        // The outermost frame is the function the address belongs to
        let mut outermost = None;
        while let Ok(Some(frame)) = frame_iter.next() {
            if let Some(name) = frame.function.and_then(|f| f.demangle().ok().map(|s| s.to_string()))
            {
                outermost = Some(name);
            }
        }
        outermost
    }

    fn symbol_function(&self, addr: u64) -> Option<String> {
        // Last symbol starting at or before addr
        let idx = self.symbols.partition_point(|sym| sym.addr <= addr);
        let sym = self.symbols.get(idx.checked_sub(1)?)?;

        let inside = if sym.size == 0 { sym.addr == addr } else { addr < sym.addr + sym.size };
        inside.then(|| Self::demangle_symbol(&sym.name))
    }
}

/// Collect defined function symbols from `.symtab` and `.dynsym`
fn function_symbols(obj: &object::File<'_>) -> Vec<ElfSymbol> {
    let mut symbols: Vec<ElfSymbol> = obj
        .symbols()
        .chain(obj.dynamic_symbols())
        .filter(|sym| sym.kind() == SymbolKind::Text && sym.is_definition() && sym.address() != 0)
        .filter_map(|sym| {
            let name = sym.name().ok()?;
            if name.is_empty() {
                return None;
            }
            Some(ElfSymbol { addr: sym.address(), size: sym.size(), name: name.to_string() })
        })
        .collect();

    symbols.sort_by(|a, b| a.addr.cmp(&b.addr).then_with(|| b.size.cmp(&a.size)));
    symbols.dedup_by_key(|sym| sym.addr);
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demangle_rust_symbol() {
        let name = Symbolizer::demangle_symbol("_ZN4core3fmt5write17h0123456789abcdefE");
        assert_eq!(name, "core::fmt::write");
    }

    #[test]
    fn test_demangle_passthrough() {
        assert_eq!(Symbolizer::demangle_symbol("malloc"), "malloc");
    }

    #[test]
    fn test_missing_binary_is_error() {
        assert!(Symbolizer::new("/nonexistent/path/to/binary").is_err());
    }
}
