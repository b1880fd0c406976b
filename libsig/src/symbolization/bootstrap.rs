//! Bootstrap symbol-name files.
//!
//! A bootstrap file pre-populates the symbol pool before tracing starts, so
//! names known ahead of time (for example PLT targets logged by the dynamic
//! loader) win over the host's lazy resolution. One `address,name` pair per
//! line, address in hexadecimal with or without a `0x` prefix:
//!
//! ```text
//! 0x7f3a2c01e2b0,malloc
//! 401126,init_fn
//! ```
//!
//! Blank lines are ignored and malformed ones skipped (the load summary counts
//! them). Carriage returns are ignored so files written on Windows load
//! unchanged. Invalid UTF-8 in a name is replaced, not rejected.

use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::pool::SymbolPool;
use crate::domain::{Address, TrackerError};

/// Parse one bootstrap line into an address and a name
///
/// Returns `None` for lines without a comma, with a null or unparsable
/// address, or with an empty name.
#[must_use]
pub fn parse_symbol_line(line: &str) -> Option<(Address, &str)> {
    let line = line.trim_end_matches('\r');
    let (addr, name) = line.split_once(',')?;
    let addr = parse_hex_prefix(addr.trim())?;
    let name = name.trim_end();

    if addr == 0 || name.is_empty() {
        return None;
    }

    Some((Address(addr), name))
}

/// Load a bootstrap file into the pool
///
/// Returns the number of names applied. Addresses listed more than once keep
/// the first name.
///
/// # Errors
/// Returns [`TrackerError::SymbolFileUnreadable`] if the file cannot be
/// opened, and [`TrackerError::Io`] on read failures.
pub fn load_symbol_names(pool: &mut SymbolPool, path: &Path) -> Result<usize, TrackerError> {
    let file = File::open(path)
        .map_err(|source| TrackerError::SymbolFileUnreadable { path: path.to_path_buf(), source })?;

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut applied = 0;
    let mut skipped = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches('\n');
        if line.trim().is_empty() {
            continue;
        }

        let Some((addr, name)) = parse_symbol_line(line) else {
            skipped += 1;
            continue;
        };

        let handle = pool.intern(addr)?;
        if pool.set_name(handle, Some(name.to_string())) {
            applied += 1;
        } else {
            debug!("Duplicate bootstrap entry for {addr} ({name}), keeping first");
        }
    }

    info!("Loaded {applied} symbol names from {} ({skipped} lines skipped)", path.display());
    Ok(applied)
}

/// Write `0x<addr>,<name>` lines in bootstrap format
///
/// # Errors
/// Returns an error if writing fails.
pub fn write_symbol_names<'a, W, I>(mut writer: W, entries: I) -> std::io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = (u64, &'a str)>,
{
    let mut count = 0;
    for (addr, name) in entries {
        writeln!(writer, "0x{addr:x},{name}")?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Parse the leading hexadecimal digits of `text`
///
/// An optional `0x`/`0X` prefix is accepted; trailing garbage after the
/// digits is ignored.
fn parse_hex_prefix(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let end = digits.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    u64::from_str_radix(&digits[..end], 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_hex() {
        assert_eq!(parse_symbol_line("1000,init_fn"), Some((Address(0x1000), "init_fn")));
    }

    #[test]
    fn test_parse_prefixed_hex_with_cr() {
        assert_eq!(parse_symbol_line("0x7f00beef,malloc\r"), Some((Address(0x7f00_beef), "malloc")));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_symbol_line("no comma here"), None);
        assert_eq!(parse_symbol_line("zzz,name"), None);
        assert_eq!(parse_symbol_line("0,name"), None);
        assert_eq!(parse_symbol_line("1000,"), None);
    }

    #[test]
    fn test_name_keeps_later_commas() {
        assert_eq!(
            parse_symbol_line("2000,operator,(A, B)"),
            Some((Address(0x2000), "operator,(A, B)"))
        );
    }

    #[test]
    fn test_load_mixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbols.txt");
        std::fs::write(
            &path,
            b"1000,init_fn\n\n   \nnot a symbol line\n0x2000,caf\xff\n\xff\xfe,garbage\n\
              1000,shadowed\r\n0x3000,main\r\n4000,tail",
        )
        .unwrap();

        let mut pool = SymbolPool::new();
        let applied = load_symbol_names(&mut pool, &path).unwrap();

        assert_eq!(applied, 4);
        assert_eq!(pool.entries(), 4);
        let name = |addr| pool.name_of(pool.lookup(Address(addr)).unwrap().unwrap());
        assert_eq!(name(0x1000), Some("init_fn"));
        assert_eq!(name(0x2000), Some("caf\u{FFFD}"));
        assert_eq!(name(0x3000), Some("main"));
        assert_eq!(name(0x4000), Some("tail"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut pool = SymbolPool::new();
        let result = load_symbol_names(&mut pool, &dir.path().join("absent.txt"));
        assert!(matches!(result, Err(TrackerError::SymbolFileUnreadable { .. })));
    }

    #[test]
    fn test_write_format() {
        let mut out = Vec::new();
        let n = write_symbol_names(&mut out, [(0x1000u64, "a"), (0x2abc, "b")]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "0x1000,a\n0x2abc,b\n");
    }
}
