//! # Tracker: Lifecycle Façade
//!
//! Owns the range set, the symbol pool and the thread table, and exposes
//! them through the notifications an instrumentation host delivers:
//!
//! ```text
//! Tracker::new(config)        post-configuration init, thread 1 running
//!   start_client_code(host)   main image mapped; default range installed
//!   run_thread(tid)           host switched threads
//!   observe(host, addr)       every executed block: classify + track
//!   pre/post_deliver_signal   signal handler entry / return
//! finish(host)                dump records, tear down, integrity checks
//! ```

use log::{debug, info, warn};
use std::path::PathBuf;

use crate::classification::RangeSet;
use crate::config::{expand_output_path, RecordMode, TrackerConfig};
use crate::domain::{Address, Region, ThreadId, TrackerError};
use crate::export::dump_records;
use crate::host::Host;
use crate::symbolization::{load_symbol_names, SymbolPool};
use crate::tracking::{ThreadStateManager, TransitionRecorder};

/// Summary of a completed tracking session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishReport {
    /// Threads that ever ran
    pub threads: usize,
    /// Unique symbols interned
    pub symbols: usize,
    /// Record lines written to the records file
    pub records_written: usize,
    /// Where the records went, if a records file was configured
    pub output: Option<PathBuf>,
}

/// Region-transition tracker for one traced process
#[derive(Debug)]
pub struct Tracker {
    ranges: RangeSet,
    pool: SymbolPool,
    threads: ThreadStateManager,
    recorder: TransitionRecorder,
    records_file: Option<String>,
    client_started: bool,
}

impl Tracker {
    /// Initialise the tracker after configuration
    ///
    /// Installs the explicit bound (if any), loads the bootstrap symbol file
    /// and makes thread 1 the running thread.
    ///
    /// # Errors
    /// Returns configuration errors for an invalid bound and
    /// [`TrackerError::SymbolFileUnreadable`] for a missing symbols file.
    pub fn new(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let mut ranges = RangeSet::new();
        if let Some(bound) = config.bound {
            ranges.add_range(bound.addr, bound.length)?;
        }

        let mut pool = SymbolPool::new();
        if let Some(path) = &config.symbols_file {
            load_symbol_names(&mut pool, path)?;
        }

        let mut threads = ThreadStateManager::new();
        threads.switch_to(ThreadId(1))?;

        info!(
            "Tracker initialised: recording {} (coalesce: {})",
            config.mode.direction, config.mode.coalesce
        );

        Ok(Self {
            ranges,
            pool,
            threads,
            recorder: TransitionRecorder::new(config.mode),
            records_file: config.records_file.clone(),
            client_started: false,
        })
    }

    #[must_use]
    pub fn mode(&self) -> RecordMode {
        self.recorder.mode()
    }

    #[must_use]
    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    #[must_use]
    pub fn pool(&self) -> &SymbolPool {
        &self.pool
    }

    #[must_use]
    pub fn threads(&self) -> &ThreadStateManager {
        &self.threads
    }

    /// The traced program's own code is about to run
    ///
    /// Only the first call has an effect. Without an explicit bound, the
    /// main executable's code segment becomes the inbound range.
    ///
    /// # Errors
    /// Returns [`TrackerError::NoDefaultRange`] if no range is configured
    /// and the host cannot report a code segment.
    pub fn start_client_code<H: Host + ?Sized>(&mut self, host: &H) -> Result<(), TrackerError> {
        if self.client_started {
            return Ok(());
        }
        self.client_started = true;

        if self.ranges.has_ranges() {
            return Ok(());
        }

        let segment = host.main_code_segment().ok_or(TrackerError::NoDefaultRange)?;
        info!("Using main code segment {}+{} as inbound range", segment.start, segment.size);
        self.ranges.add_range(segment.start, segment.size)
    }

    /// The host switched to another thread
    ///
    /// # Errors
    /// Propagates thread switching errors
    pub fn run_thread(&mut self, tid: ThreadId) -> Result<(), TrackerError> {
        self.threads.switch_to(tid)
    }

    /// Classify an address against the inbound ranges
    #[must_use]
    pub fn classify(&self, addr: Address) -> Region {
        self.ranges.classify(addr)
    }

    /// Record a transition for an already classified address
    ///
    /// # Errors
    /// Propagates thread switching and symbol interning errors
    pub fn track<H: Host + ?Sized>(
        &mut self,
        host: &H,
        addr: Address,
        region: Region,
    ) -> Result<(), TrackerError> {
        self.recorder.record_transition(&mut self.threads, &mut self.pool, host, addr, region)
    }

    /// Classify and track one executed address
    ///
    /// # Errors
    /// Propagates thread switching and symbol interning errors
    pub fn observe<H: Host + ?Sized>(&mut self, host: &H, addr: Address) -> Result<(), TrackerError> {
        let region = self.classify(addr);
        self.track(host, addr, region)
    }

    /// A signal handler is about to run on `tid`
    ///
    /// # Errors
    /// Propagates thread switching errors
    pub fn pre_deliver_signal(&mut self, tid: ThreadId) -> Result<(), TrackerError> {
        self.threads.switch_to(tid)?;
        if let Some(state) = self.threads.active_state_mut() {
            state.push_signal_context();
            debug!("thread {tid}: signal handler entered (depth {})", state.signal_depth());
        }
        Ok(())
    }

    /// A signal handler on `tid` returned
    ///
    /// # Errors
    /// Propagates thread switching errors
    pub fn post_deliver_signal(&mut self, tid: ThreadId) -> Result<(), TrackerError> {
        self.threads.switch_to(tid)?;
        if let Some(state) = self.threads.active_state_mut() {
            if state.pop_signal_context() {
                debug!("thread {tid}: signal handler returned (depth {})", state.signal_depth());
            } else {
                warn!("thread {tid}: signal return without a pending handler");
            }
        }
        Ok(())
    }

    /// The traced program terminated
    ///
    /// Writes the records file if one is configured, then tears down the
    /// thread table and the symbol pool.
    ///
    /// # Errors
    /// Returns [`TrackerError::OutputUnopenable`] or [`TrackerError::Io`] if
    /// the records cannot be written, and [`TrackerError::PoolLeak`] if the
    /// pool fails its integrity check.
    pub fn finish<H: Host + ?Sized>(mut self, host: &H) -> Result<FinishReport, TrackerError> {
        self.threads.sync_active()?;

        let mut records_written = 0;
        let output = match &self.records_file {
            Some(template) => {
                let path = expand_output_path(template, host.process_id());
                records_written =
                    dump_records(&path, &mut self.threads, &self.pool, self.recorder.mode())?;
                Some(path)
            }
            None => None,
        };

        let symbols = self.pool.entries();
        let threads = self.threads.destroy();
        self.pool.destroy()?;

        Ok(FinishReport { threads, symbols, records_written, output })
    }
}
