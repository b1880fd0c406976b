//! Region classification of code addresses.
//!
//! The tracker splits the traced program's address space into two regions:
//! **inbound** (the program's own code) and **outbound** (everything else,
//! mostly shared libraries). The inbound side is a small set of address
//! ranges, either configured explicitly or discovered from the main
//! executable's code segment once it has been mapped.
//!
//! # Range Semantics
//!
//! A range added with [`RangeSet::add_range`]`(addr, size)` covers
//! `addr ..= addr + size`, both bounds inclusive. Lookups are a linear scan:
//! range sets hold one or two entries in practice.

use log::debug;

use crate::domain::{Address, Region, TrackerError};

/// An inclusive address interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: Address,
    pub end: Address,
}

impl AddressRange {
    /// Check if an address falls within this range (both bounds inclusive)
    #[must_use]
    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr <= self.end
    }
}

/// Code segment reported by the host's discovery service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSegment {
    pub start: Address,
    pub size: u64,
}

/// Ordered collection of inbound ranges
#[derive(Debug, Default)]
pub struct RangeSet {
    ranges: Vec<AddressRange>,
}

impl RangeSet {
    /// Create an empty range set (everything classifies as outbound)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the range `[addr, addr + size]`
    ///
    /// # Errors
    /// A zero `size` or a null `addr` is a configuration error.
    pub fn add_range(&mut self, addr: Address, size: u64) -> Result<(), TrackerError> {
        if size == 0 {
            return Err(TrackerError::ZeroLengthRange(addr));
        }
        if addr.is_null() {
            return Err(TrackerError::ZeroAddress);
        }

        let range = AddressRange { start: addr, end: Address(addr.0.saturating_add(size)) };
        debug!("Inbound range: {} - {} (size: {size})", range.start, range.end);
        self.ranges.push(range);
        Ok(())
    }

    /// Returns true once at least one range exists
    #[must_use]
    pub fn has_ranges(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Drop every range
    pub fn clear_all(&mut self) {
        self.ranges.clear();
    }

    /// Classify an address as inbound or outbound
    ///
    /// Never returns [`Region::NoRegion`]; with no ranges configured every
    /// address is outbound.
    #[must_use]
    pub fn classify(&self, addr: Address) -> Region {
        if self.ranges.iter().any(|range| range.contains(addr)) {
            Region::Inbound
        } else {
            Region::Outbound
        }
    }

    /// Configured ranges, in insertion order
    #[must_use]
    pub fn ranges(&self) -> &[AddressRange] {
        &self.ranges
    }
}
