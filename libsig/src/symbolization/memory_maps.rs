//! Memory mapping utilities for locating the main program image
//!
//! The default inbound range is the main executable's code segment. It can
//! be read from a `/proc/<pid>/maps` snapshot (the executable mapping of the
//! binary) or, for non-PIE binaries, straight from the ELF `.text` section.

use anyhow::{bail, Context, Result};
use log::info;
use object::{Object, ObjectSection};
use std::fs;
use std::path::Path;

use crate::classification::CodeSegment;
use crate::domain::Address;

/// Memory range of a loaded binary in a process's address space (end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Layout of the main binary as seen in a memory map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    /// Span of every mapping of the binary (lowest start to highest end)
    pub image: MemoryRange,
    /// The executable mapping, if one was found
    pub code: Option<MemoryRange>,
}

impl ImageLayout {
    /// Code segment in the form the host's discovery service reports it
    #[must_use]
    pub fn code_segment(&self) -> Option<CodeSegment> {
        self.code.map(|code| CodeSegment {
            start: Address(code.start),
            size: code.end.saturating_sub(code.start),
        })
    }
}

/// Parse the text of a `/proc/<pid>/maps` file to find a binary's layout
///
/// All mappings whose path contains `binary_path` contribute to the image
/// span; the first one with `x` permission is the code mapping.
///
/// # Errors
/// Returns an error if a matching line has a malformed, empty or reversed
/// range, or the binary has no mapping at all
pub fn parse_memory_maps(maps: &str, binary_path: &str) -> Result<ImageLayout> {
    let mut image: Option<MemoryRange> = None;
    let mut code = None;

    for line in maps.lines() {
        if !line.contains(binary_path) {
            continue;
        }

        // Parse the line: "start-end perms offset dev inode pathname"
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }
        let Some((start, end)) = parts[0].split_once('-') else {
            continue;
        };
        let start = u64::from_str_radix(start, 16).context("Failed to parse range start")?;
        let end = u64::from_str_radix(end, 16).context("Failed to parse range end")?;
        if end <= start {
            bail!("Empty or reversed mapping range in maps line: {line}");
        }

        // Track the minimum start and maximum end
        image = Some(match image {
            Some(r) => MemoryRange { start: r.start.min(start), end: r.end.max(end) },
            None => MemoryRange { start, end },
        });

        if code.is_none() && parts[1].contains('x') {
            code = Some(MemoryRange { start, end });
        }
    }

    let image = image.with_context(|| format!("Could not find memory range for {binary_path}"))?;
    info!(
        "Executable memory range: 0x{:x} - 0x{:x} (size: {} KB)",
        image.start,
        image.end,
        image.end.saturating_sub(image.start) / 1024
    );

    Ok(ImageLayout { image, code })
}

/// Read a maps snapshot from disk and parse it
///
/// # Errors
/// Returns an error if the file cannot be read or does not mention the binary
pub fn read_memory_maps(maps_path: &Path, binary_path: &str) -> Result<ImageLayout> {
    let maps = fs::read_to_string(maps_path)
        .with_context(|| format!("Failed to read {}", maps_path.display()))?;
    parse_memory_maps(&maps, binary_path)
}

/// Find the `.text` section of an ELF binary at its link-time address
///
/// # Errors
/// Returns an error if the binary cannot be read or parsed
pub fn text_section(binary_path: &Path) -> Result<Option<CodeSegment>> {
    let data = fs::read(binary_path)
        .with_context(|| format!("Failed to read binary: {}", binary_path.display()))?;
    let obj = object::File::parse(&*data).context("Failed to parse object file")?;

    Ok(obj
        .section_by_name(".text")
        .filter(|section| section.address() != 0 && section.size() > 0)
        .map(|section| CodeSegment { start: Address(section.address()), size: section.size() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
555555554000-555555555000 r--p 00000000 08:01 1234 /usr/local/bin/demo
555555555000-555555556000 r-xp 00001000 08:01 1234 /usr/local/bin/demo
555555556000-555555557000 r--p 00002000 08:01 1234 /usr/local/bin/demo
7ffff7dd3000-7ffff7dfc000 r-xp 00000000 08:01 5678 /lib/x86_64-linux-gnu/ld-2.31.so
";

    #[test]
    fn test_memory_range_contains() {
        let range = MemoryRange { start: 0x1000, end: 0x2000 };

        assert!(range.contains(0x1000));
        assert!(range.contains(0x1FFF));
        assert!(!range.contains(0x0FFF));
        assert!(!range.contains(0x2000));
    }

    #[test]
    fn test_parse_memory_maps_finds_code() {
        let layout = parse_memory_maps(MAPS, "/usr/local/bin/demo").unwrap();

        assert_eq!(layout.image, MemoryRange { start: 0x5555_5555_4000, end: 0x5555_5555_7000 });
        assert_eq!(layout.code, Some(MemoryRange { start: 0x5555_5555_5000, end: 0x5555_5555_6000 }));

        let segment = layout.code_segment().unwrap();
        assert_eq!(segment.start, Address(0x5555_5555_5000));
        assert_eq!(segment.size, 0x1000);
    }

    #[test]
    fn test_parse_memory_maps_missing_binary() {
        assert!(parse_memory_maps(MAPS, "/usr/bin/other").is_err());
    }

    #[test]
    fn test_parse_memory_maps_rejects_reversed_range() {
        let maps = "555555556000-555555555000 r-xp 00001000 08:01 1234 /usr/local/bin/demo\n";
        let err = parse_memory_maps(maps, "/usr/local/bin/demo").unwrap_err();
        assert!(err.to_string().contains("555555556000-555555555000"));
    }

    #[test]
    fn test_parse_memory_maps_rejects_empty_range() {
        let maps = "555555555000-555555555000 r-xp 00001000 08:01 1234 /usr/local/bin/demo\n";
        assert!(parse_memory_maps(maps, "/usr/local/bin/demo").is_err());
    }

    #[test]
    fn test_text_section_of_missing_file() {
        assert!(text_section(Path::new("/nonexistent/binary")).is_err());
    }
}
