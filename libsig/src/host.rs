//! The seam between the tracker and the instrumentation host
//!
//! The tracker never inspects the traced process itself. Everything it needs
//! to know about the outside world (which thread runs, what an address is
//! called, where the main program's code lives) comes through [`Host`]. The
//! replay driver implements it over a recorded trace; a live binary
//! translator would implement it over its own thread and debug-info
//! services.

use crate::classification::CodeSegment;
use crate::domain::{Address, ThreadId};

/// Services the instrumentation host provides to the tracker
pub trait Host {
    /// Thread the host is currently executing, `ThreadId::INVALID` if none
    fn running_thread(&self) -> ThreadId;

    /// Name of the function containing `addr`, if the host knows one
    fn resolve_symbol_name(&self, addr: Address) -> Option<String>;

    /// Code segment of the main executable, once it has been mapped
    fn main_code_segment(&self) -> Option<CodeSegment>;

    /// Process id substituted for `%p` in the records path
    fn process_id(&self) -> u32 {
        std::process::id()
    }
}

