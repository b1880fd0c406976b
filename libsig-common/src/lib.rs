//! # Shared Data Structures (Host ↔ Tracker)
//!
//! Defines the values exchanged between an instrumentation host and the
//! tracker core. The host shim passes regions as plain machine words at each
//! instrumentation call site, so [`Region`] is `#[repr(u8)]`.
//!
//! ## Key Items
//!
//! - [`Region`] - Inbound/outbound classification of a code address
//! - [`INVALID_THREAD_ID`] / [`MAX_THREADS`] - Host thread-slot contract
//! - [`DEFAULT_POOL_SIZE`] - Initial bucket count of the symbol pool
//! - [`UNKNOWN_SYMBOL_NAME`] - Placeholder written for unresolved symbols

#![cfg_attr(not(test), no_std)]

use core::fmt;

// ============================================================================
// Thread Slot Contract
// ============================================================================

/// Sentinel thread ID meaning "no thread is running"
///
/// The host reports this value before the first thread starts and after the
/// last one exits. Real thread IDs start at 1.
pub const INVALID_THREAD_ID: u32 = 0;

/// Maximum number of thread slots the host hands out
///
/// Thread IDs are dense indices in `1..MAX_THREADS`, recycled by the host when
/// threads exit. Anything at or above this bound is a contract violation.
pub const MAX_THREADS: usize = 500;

// ============================================================================
// Symbol Pool Sizing
// ============================================================================

/// Initial number of buckets in the symbol pool (4k symbols)
pub const DEFAULT_POOL_SIZE: usize = 4096;

/// Name written for addresses the host could not resolve
pub const UNKNOWN_SYMBOL_NAME: &str = "???";

// ============================================================================
// Region Classification
// ============================================================================

/// Region a code address belongs to
///
/// **Memory Layout**: `#[repr(u8)]` so the host can pass the tag as an
/// immediate argument to the tracking call.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    /// No address has been classified yet on this thread
    #[default]
    NoRegion = 0,

    /// Program's own code (the configured or auto-detected ranges)
    Inbound = 1,

    /// Everything else: shared libraries, loader, JIT code
    Outbound = 2,
}

impl Region {
    /// Lowercase tag used in the records file
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Region::NoRegion => "nobound",
            Region::Inbound => "inbound",
            Region::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_tags() {
        assert_eq!(Region::Inbound.as_str(), "inbound");
        assert_eq!(Region::Outbound.as_str(), "outbound");
        assert_eq!(Region::default(), Region::NoRegion);
    }
}
