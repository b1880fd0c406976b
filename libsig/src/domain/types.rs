//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent passing a thread ID where a code address is
//! expected (both are plain integers at the host boundary).

use libsig_common::{INVALID_THREAD_ID, MAX_THREADS};
use std::fmt;

/// Code address in the traced program's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub u64);

impl Address {
    /// Returns true for the null address, which is never a valid code location
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for Address {
    fn from(addr: u64) -> Self {
        Address(addr)
    }
}

/// Thread ID as reported by the instrumentation host
///
/// This is the host's dense thread-slot index, not a kernel TID.
/// `ThreadId::INVALID` means no thread is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u32);

impl ThreadId {
    /// The "no thread" sentinel
    pub const INVALID: ThreadId = ThreadId(INVALID_THREAD_ID);

    /// Returns true unless this is the "no thread" sentinel
    #[must_use]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Returns true if this ID fits in the host's thread-slot table
    #[must_use]
    pub fn in_bounds(self) -> bool {
        (self.0 as usize) < MAX_THREADS
    }

    /// Slot index in per-thread tables
    #[must_use]
    pub fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
