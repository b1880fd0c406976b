//! # Trace Replay
//!
//! Drives a [`Tracker`] from a recorded execution trace instead of a live
//! instrumentation host. Each event is applied in order:
//!
//! ```text
//! pid N         host.set_pid(N)
//! start         tracker.start_client_code(host)
//! run T         host.set_running(T); tracker.run_thread(T)
//! exec T A      host.set_running(T); tracker.observe(host, A)
//! signal T      host.set_running(T); tracker.pre_deliver_signal(T)
//! sigreturn T   host.set_running(T); tracker.post_deliver_signal(T)
//! ```
//!
//! `exec` does not notify the tracker of the switch itself: the recorder
//! notices the changed running thread on its own.

pub mod host;
pub mod trace_file;

pub use host::ReplayHost;
pub use trace_file::{parse_event, parse_trace, TraceEvent};

use log::debug;

use crate::domain::ReplayError;
use crate::tracker::Tracker;

/// Counters for one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: usize,
    pub executed: usize,
    pub signals: usize,
}

/// Apply `events` to `tracker`
///
/// # Errors
/// Returns the first tracker error, wrapped in [`ReplayError::Tracker`]
pub fn replay<I>(
    tracker: &mut Tracker,
    host: &ReplayHost,
    events: I,
) -> Result<ReplayStats, ReplayError>
where
    I: IntoIterator<Item = TraceEvent>,
{
    let mut stats = ReplayStats::default();

    for event in events {
        stats.events += 1;
        match event {
            TraceEvent::Pid(pid) => host.set_pid(pid),
            TraceEvent::Start => tracker.start_client_code(host)?,
            TraceEvent::Run(tid) => {
                host.set_running(tid);
                tracker.run_thread(tid)?;
            }
            TraceEvent::Exec(tid, addr) => {
                host.set_running(tid);
                tracker.observe(host, addr)?;
                stats.executed += 1;
            }
            TraceEvent::Signal(tid) => {
                host.set_running(tid);
                tracker.pre_deliver_signal(tid)?;
                stats.signals += 1;
            }
            TraceEvent::SigReturn(tid) => {
                host.set_running(tid);
                tracker.post_deliver_signal(tid)?;
            }
        }
    }

    debug!("Replayed {} events ({} executed blocks)", stats.events, stats.executed);
    Ok(stats)
}
