//! Region transition detection and recording
//!
//! Called once per executed code block with the block's address and its
//! classification. A record is produced only when the running thread's
//! region changes *and* the new region is one the mode records:
//!
//! ```text
//! addr  region    previous   action (outbound mode)
//! A     inbound   none       region := inbound
//! B     outbound  inbound    region := outbound, record B
//! C     outbound  outbound   nothing (same region)
//! A     inbound   outbound   region := inbound
//! ```

use log::trace;

use super::record::Record;
use super::threads::ThreadStateManager;
use crate::config::RecordMode;
use crate::domain::{Address, Region, TrackerError};
use crate::host::Host;
use crate::symbolization::SymbolPool;

/// Applies the record mode to observed transitions
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionRecorder {
    mode: RecordMode,
}

impl TransitionRecorder {
    #[must_use]
    pub fn new(mode: RecordMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub fn mode(&self) -> RecordMode {
        self.mode
    }

    /// Process one executed address
    ///
    /// Switches to the host's running thread first if it differs from the
    /// active one. With no running thread the call is ignored.
    ///
    /// # Errors
    /// Propagates thread switching errors and [`TrackerError::ZeroAddress`]
    /// for a null address that would have been recorded.
    pub fn record_transition<H: Host + ?Sized>(
        &self,
        threads: &mut ThreadStateManager,
        pool: &mut SymbolPool,
        host: &H,
        addr: Address,
        region: Region,
    ) -> Result<(), TrackerError> {
        let running = host.running_thread();
        if running != threads.current_thread() {
            threads.switch_to(running)?;
        }

        let Some(state) = threads.active_state_mut() else {
            return Ok(());
        };

        if state.region == region {
            return Ok(());
        }
        if !self.mode.records(region) {
            state.region = region;
            return Ok(());
        }

        // A rejected address must leave the thread state unchanged
        let handle = pool.intern(addr)?;
        state.region = region;
        pool.resolve_with(handle, |addr| host.resolve_symbol_name(addr));

        trace!(
            "thread {running}: {region} {addr} {}",
            pool.name_of(handle).unwrap_or(libsig_common::UNKNOWN_SYMBOL_NAME)
        );

        let tagged = self.mode.is_tagged();
        match state.log.last_mut() {
            Some(last)
                if self.mode.coalesce
                    && last.symbol == handle
                    && (!tagged || last.region == region) =>
            {
                last.count = last.count.saturating_add(1);
            }
            _ => state.log.push(Record::new(handle, region)),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::CodeSegment;
    use crate::config::RecordDirection;
    use crate::domain::ThreadId;
    use std::cell::Cell;

    struct FakeHost {
        tid: Cell<u32>,
        lookups: Cell<usize>,
    }

    impl FakeHost {
        fn new(tid: u32) -> Self {
            Self { tid: Cell::new(tid), lookups: Cell::new(0) }
        }
    }

    impl Host for FakeHost {
        fn running_thread(&self) -> ThreadId {
            ThreadId(self.tid.get())
        }

        fn resolve_symbol_name(&self, addr: Address) -> Option<String> {
            self.lookups.set(self.lookups.get() + 1);
            (addr.0 == 0x7000).then(|| "puts".to_string())
        }

        fn main_code_segment(&self) -> Option<CodeSegment> {
            None
        }
    }

    fn feed(
        recorder: TransitionRecorder,
        host: &FakeHost,
        steps: &[(u64, Region)],
    ) -> (ThreadStateManager, SymbolPool) {
        let mut threads = ThreadStateManager::new();
        let mut pool = SymbolPool::new();
        for &(addr, region) in steps {
            recorder
                .record_transition(&mut threads, &mut pool, host, Address(addr), region)
                .unwrap();
        }
        (threads, pool)
    }

    #[test]
    fn test_outbound_records_only_entries_into_outbound() {
        let host = FakeHost::new(1);
        let recorder = TransitionRecorder::new(RecordMode::default());
        let (threads, pool) = feed(
            recorder,
            &host,
            &[
                (0x1000, Region::Inbound),
                (0x7000, Region::Outbound),
                (0x7100, Region::Outbound),
                (0x1010, Region::Inbound),
            ],
        );

        let log = &threads.active_state().unwrap().log;
        assert_eq!(log.len(), 1);
        assert_eq!(pool.address_of(log[0].symbol), Address(0x7000));
        assert_eq!(pool.name_of(log[0].symbol), Some("puts"));
        assert_eq!(log[0].count, 1);
    }

    #[test]
    fn test_inbound_mode_records_returns() {
        let host = FakeHost::new(1);
        let recorder = TransitionRecorder::new(RecordMode::new(RecordDirection::Inbound, true));
        let (threads, pool) = feed(
            recorder,
            &host,
            &[(0x1000, Region::Inbound), (0x7000, Region::Outbound), (0x1010, Region::Inbound)],
        );

        let log = &threads.active_state().unwrap().log;
        let addrs: Vec<_> = log.iter().map(|r| pool.address_of(r.symbol)).collect();
        assert_eq!(addrs, vec![Address(0x1000), Address(0x1010)]);
    }

    #[test]
    fn test_count_mode_coalesces_repeated_address() {
        let host = FakeHost::new(1);
        let recorder = TransitionRecorder::new(RecordMode::default());
        let (threads, _) = feed(
            recorder,
            &host,
            &[
                (0x1000, Region::Inbound),
                (0x7000, Region::Outbound),
                (0x1000, Region::Inbound),
                (0x7000, Region::Outbound),
            ],
        );

        let log = &threads.active_state().unwrap().log;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].count, 2);
        assert_eq!(host.lookups.get(), 1);
    }

    #[test]
    fn test_count_mode_without_coalescing_keeps_each_hit() {
        let host = FakeHost::new(1);
        let recorder = TransitionRecorder::new(RecordMode::new(RecordDirection::Outbound, false));
        let (threads, _) = feed(
            recorder,
            &host,
            &[
                (0x1000, Region::Inbound),
                (0x7000, Region::Outbound),
                (0x1000, Region::Inbound),
                (0x7000, Region::Outbound),
            ],
        );

        let log = &threads.active_state().unwrap().log;
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|r| r.count == 1));
    }

    #[test]
    fn test_tagged_mode_records_both_directions() {
        let host = FakeHost::new(1);
        let recorder = TransitionRecorder::new(RecordMode::new(RecordDirection::Both, true));
        let (threads, _) = feed(
            recorder,
            &host,
            &[(0x1000, Region::Inbound), (0x7000, Region::Outbound), (0x1010, Region::Inbound)],
        );

        let regions: Vec<_> =
            threads.active_state().unwrap().log.iter().map(|r| r.region).collect();
        assert_eq!(regions, vec![Region::Inbound, Region::Outbound, Region::Inbound]);
    }

    #[test]
    fn test_follows_running_thread() {
        let host = FakeHost::new(1);
        let recorder = TransitionRecorder::new(RecordMode::default());
        let mut threads = ThreadStateManager::new();
        let mut pool = SymbolPool::new();

        recorder
            .record_transition(&mut threads, &mut pool, &host, Address(0x7000), Region::Outbound)
            .unwrap();
        host.tid.set(2);
        recorder
            .record_transition(&mut threads, &mut pool, &host, Address(0x1000), Region::Inbound)
            .unwrap();

        assert_eq!(threads.current_thread(), ThreadId(2));
        assert!(threads.active_state().unwrap().log.is_empty());
        threads.switch_to(ThreadId(1)).unwrap();
        assert_eq!(threads.active_state().unwrap().log.len(), 1);
    }

    #[test]
    fn test_null_address_leaves_state_untouched() {
        let host = FakeHost::new(1);
        let recorder = TransitionRecorder::new(RecordMode::default());
        let mut threads = ThreadStateManager::new();
        let mut pool = SymbolPool::new();

        let result =
            recorder.record_transition(&mut threads, &mut pool, &host, Address(0), Region::Outbound);

        assert!(matches!(result, Err(TrackerError::ZeroAddress)));
        let state = threads.active_state().unwrap();
        assert_eq!(state.region, Region::NoRegion);
        assert!(state.log.is_empty());
        assert_eq!(pool.entries(), 0);
        assert_eq!(host.lookups.get(), 0);
    }

    #[test]
    fn test_no_running_thread_is_ignored() {
        let host = FakeHost::new(0);
        let recorder = TransitionRecorder::new(RecordMode::default());
        let (threads, pool) = feed(recorder, &host, &[(0x7000, Region::Outbound)]);

        assert_eq!(threads.thread_count(), 0);
        assert_eq!(pool.entries(), 0);
    }
}
