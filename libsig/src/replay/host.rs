//! Host implementation backed by a recorded trace

use std::cell::Cell;

use crate::classification::CodeSegment;
use crate::domain::{Address, ThreadId};
use crate::host::Host;
use crate::symbolization::{ImageLayout, Symbolizer};

/// Stand-in instrumentation host for trace replay
///
/// The running thread follows the trace's events. Names come from the
/// target binary's debug info, with runtime addresses inside the main image
/// translated back to file addresses first.
pub struct ReplayHost {
    running: Cell<ThreadId>,
    pid: Cell<u32>,
    symbolizer: Option<Symbolizer>,
    layout: Option<ImageLayout>,
    code_segment: Option<CodeSegment>,
}

impl ReplayHost {
    /// Create a host with thread 1 running and no symbol source
    #[must_use]
    pub fn new() -> Self {
        Self {
            running: Cell::new(ThreadId(1)),
            pid: Cell::new(std::process::id()),
            symbolizer: None,
            layout: None,
            code_segment: None,
        }
    }

    /// Resolve names through `symbolizer`
    #[must_use]
    pub fn with_symbolizer(mut self, symbolizer: Symbolizer) -> Self {
        self.symbolizer = Some(symbolizer);
        self
    }

    /// Use a memory-map snapshot for PIE adjustment and the code segment
    #[must_use]
    pub fn with_layout(mut self, layout: ImageLayout) -> Self {
        self.code_segment = self.code_segment.or_else(|| layout.code_segment());
        self.layout = Some(layout);
        self
    }

    /// Report `segment` as the main program's code segment
    #[must_use]
    pub fn with_code_segment(mut self, segment: CodeSegment) -> Self {
        self.code_segment = Some(segment);
        self
    }

    pub fn set_running(&self, tid: ThreadId) {
        self.running.set(tid);
    }

    pub fn set_pid(&self, pid: u32) {
        self.pid.set(pid);
    }

    /// Translate a runtime address into the binary's file address space
    ///
    /// Without a layout addresses are taken as-is (non-PIE). Addresses
    /// outside the image belong to libraries the symbolizer has not loaded.
    #[must_use]
    pub fn file_address(&self, addr: Address) -> Option<u64> {
        match &self.layout {
            Some(layout) if layout.image.contains(addr.0) => Some(addr.0 - layout.image.start),
            Some(_) => None,
            None => Some(addr.0),
        }
    }
}

impl Default for ReplayHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for ReplayHost {
    fn running_thread(&self) -> ThreadId {
        self.running.get()
    }

    fn resolve_symbol_name(&self, addr: Address) -> Option<String> {
        let symbolizer = self.symbolizer.as_ref()?;
        symbolizer.function_name(self.file_address(addr)?)
    }

    fn main_code_segment(&self) -> Option<CodeSegment> {
        self.code_segment
    }

    fn process_id(&self) -> u32 {
        self.pid.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolization::MemoryRange;

    #[test]
    fn test_file_address_without_layout() {
        let host = ReplayHost::new();
        assert_eq!(host.file_address(Address(0x40_1126)), Some(0x40_1126));
    }

    #[test]
    fn test_file_address_with_layout() {
        let layout = ImageLayout {
            image: MemoryRange { start: 0x5555_5555_4000, end: 0x5555_5555_7000 },
            code: Some(MemoryRange { start: 0x5555_5555_5000, end: 0x5555_5555_6000 }),
        };
        let host = ReplayHost::new().with_layout(layout);

        assert_eq!(host.file_address(Address(0x5555_5555_5126)), Some(0x1126));
        assert_eq!(host.file_address(Address(0x7fff_f7e4_a2b0)), None);
        assert_eq!(
            host.main_code_segment(),
            Some(CodeSegment { start: Address(0x5555_5555_5000), size: 0x1000 })
        );
    }

    #[test]
    fn test_running_thread_follows_updates() {
        let host = ReplayHost::new();
        assert_eq!(host.running_thread(), ThreadId(1));
        host.set_running(ThreadId(3));
        assert_eq!(host.running_thread(), ThreadId(3));
    }

    #[test]
    fn test_without_symbolizer_names_are_unknown() {
        let host = ReplayHost::new();
        assert_eq!(host.resolve_symbol_name(Address(0x40_1126)), None);
    }
}
