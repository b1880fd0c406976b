//! Tracker configuration
//!
//! The configuration surface is small: at most one explicit inbound range,
//! where to write the records, an optional bootstrap symbol file and the
//! record mode. Everything here is decided before the first tracked address
//! and never changes during a run. Diagnostic verbosity is a logger setting
//! owned by the binary.

use std::fmt;
use std::path::PathBuf;

use crate::domain::{Address, Region, TrackerError};

/// Which transitions produce records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordDirection {
    /// Only entries into the program's own code
    Inbound,
    /// Only entries into outbound code (library calls)
    #[default]
    Outbound,
    /// Every transition, tagged with its region
    Both,
}

impl fmt::Display for RecordDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordDirection::Inbound => "inbound",
            RecordDirection::Outbound => "outbound",
            RecordDirection::Both => "both",
        };
        f.write_str(name)
    }
}

/// Record payload selection
///
/// Single-direction modes record occurrence counts; `Both` records region
/// tags. Coalescing merges consecutive records of the same address: in count
/// mode the address alone must match, in tagged mode the region tag must
/// match too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMode {
    pub direction: RecordDirection,
    pub coalesce: bool,
}

impl RecordMode {
    #[must_use]
    pub fn new(direction: RecordDirection, coalesce: bool) -> Self {
        Self { direction, coalesce }
    }

    /// Returns true if entering `region` produces a record
    #[must_use]
    pub fn records(self, region: Region) -> bool {
        match self.direction {
            RecordDirection::Inbound => region == Region::Inbound,
            RecordDirection::Outbound => region == Region::Outbound,
            RecordDirection::Both => region != Region::NoRegion,
        }
    }

    /// Returns true if records carry a region tag instead of a count
    #[must_use]
    pub fn is_tagged(self) -> bool {
        self.direction == RecordDirection::Both
    }
}

impl Default for RecordMode {
    fn default() -> Self {
        Self { direction: RecordDirection::default(), coalesce: true }
    }
}

/// Explicit inbound range, as given by `addr[+length]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundSpec {
    pub addr: Address,
    pub length: u64,
}

/// Complete tracker configuration
#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    /// Explicit inbound range; `None` falls back to the main code segment
    pub bound: Option<BoundSpec>,
    /// Records output path template (`%p` expands to the pid)
    pub records_file: Option<String>,
    /// Bootstrap symbol-name file
    pub symbols_file: Option<PathBuf>,
    pub mode: RecordMode,
}

/// Parse an `addr[+length]` bound specification
///
/// The address is hexadecimal (with or without `0x`), the length decimal.
/// A missing length means 1.
///
/// # Errors
/// Returns [`TrackerError::InvalidBoundSpec`] for unparsable input and
/// [`TrackerError::ZeroAddress`] / [`TrackerError::ZeroLengthRange`] for zero
/// values.
pub fn parse_bound_spec(spec: &str) -> Result<BoundSpec, TrackerError> {
    let invalid = |reason: &str| TrackerError::InvalidBoundSpec {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let (addr, length) = match spec.split_once('+') {
        Some((addr, length)) => {
            let length =
                length.trim().parse::<u64>().map_err(|_| invalid("length is not a decimal number"))?;
            (addr, length)
        }
        None => (spec, 1),
    };

    let addr = addr.trim();
    let digits = addr.strip_prefix("0x").or_else(|| addr.strip_prefix("0X")).unwrap_or(addr);
    let addr = u64::from_str_radix(digits, 16)
        .map(Address)
        .map_err(|_| invalid("address is not a hexadecimal number"))?;

    if addr.is_null() {
        return Err(TrackerError::ZeroAddress);
    }
    if length == 0 {
        return Err(TrackerError::ZeroLengthRange(addr));
    }

    Ok(BoundSpec { addr, length })
}

/// Expand a records path template
///
/// `%p` becomes the process id and `%%` a literal percent sign; any other
/// `%` sequence is kept as is.
#[must_use]
pub fn expand_output_path(template: &str, pid: u32) -> PathBuf {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('p') => {
                chars.next();
                out.push_str(&pid.to_string());
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }

    PathBuf::from(out)
}
