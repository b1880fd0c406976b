//! Transition records and per-thread execution state

use crate::domain::Region;
use crate::symbolization::SymbolHandle;

/// One recorded transition
///
/// Which payload field is meaningful depends on the
/// [`RecordMode`](crate::config::RecordMode): `region` in tagged mode,
/// `count` in count mode. Both are always filled so a log can be written in
/// either format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub symbol: SymbolHandle,
    pub region: Region,
    /// Consecutive hits merged into this record (1 unless coalesced)
    pub count: u32,
}

impl Record {
    #[must_use]
    pub fn new(symbol: SymbolHandle, region: Region) -> Self {
        Self { symbol, region, count: 1 }
    }
}

/// Execution state of one thread
///
/// `interrupted` holds the region markers of contexts suspended by signal
/// handlers, innermost last. Handler records go into the same log.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ThreadState {
    pub region: Region,
    pub log: Vec<Record>,
    pub interrupted: Vec<Region>,
}

impl ThreadState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend the current context for a signal handler
    ///
    /// The handler starts with no region so its first tracked address is
    /// always a transition.
    pub fn push_signal_context(&mut self) {
        self.interrupted.push(self.region);
        self.region = Region::NoRegion;
    }

    /// Resume the context interrupted by the innermost handler
    ///
    /// Returns false if no handler was running.
    pub fn pop_signal_context(&mut self) -> bool {
        match self.interrupted.pop() {
            Some(region) => {
                self.region = region;
                true
            }
            None => false,
        }
    }

    /// Depth of nested signal handlers
    #[must_use]
    pub fn signal_depth(&self) -> usize {
        self.interrupted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_context_nesting() {
        let mut state = ThreadState::new();
        state.region = Region::Inbound;

        state.push_signal_context();
        assert_eq!(state.region, Region::NoRegion);
        state.region = Region::Outbound;

        state.push_signal_context();
        assert_eq!(state.signal_depth(), 2);

        assert!(state.pop_signal_context());
        assert_eq!(state.region, Region::Outbound);
        assert!(state.pop_signal_context());
        assert_eq!(state.region, Region::Inbound);
        assert!(!state.pop_signal_context());
        assert_eq!(state.region, Region::Inbound);
    }
}
