//! # Thread State Management
//!
//! The host serializes every instrumentation callback onto one logical
//! execution stream (cooperative scheduling, no preemption inside tracker
//! code), so per-thread data needs no locks. It still has to be swapped in
//! and out when the host moves to another thread.
//!
//! ## Active Cache
//!
//! The hot path only ever touches [`ActiveThreadCache`]: the id of the
//! running thread plus its state, moved out of the slot table. Each slot
//! follows a small state machine:
//!
//! ```text
//! Unseen ──switch_to──▶ Active ◀──switch_to──▶ Suspended
//! ```
//!
//! An `Active` slot is empty; its contents live in the cache until the next
//! switch moves them back. Exclusive access comes from `&mut self`, so the
//! aliasing contract is checked by the compiler rather than by convention.

use libsig_common::MAX_THREADS;
use log::debug;
use std::mem;

use super::record::ThreadState;
use crate::domain::{ThreadId, TrackerError};

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Unseen,
    Active,
    Suspended(ThreadState),
}

/// The currently selected thread and its state
#[derive(Debug, Default)]
pub struct ActiveThreadCache {
    tid: ThreadId,
    state: ThreadState,
}

impl ActiveThreadCache {
    /// Thread whose state is loaded (`ThreadId::INVALID` when detached)
    #[must_use]
    pub fn tid(&self) -> ThreadId {
        self.tid
    }

    #[must_use]
    pub fn state(&self) -> &ThreadState {
        &self.state
    }
}

/// Owner of every thread's state, keyed by host thread id
#[derive(Debug)]
pub struct ThreadStateManager {
    slots: Vec<Slot>,
    active: ActiveThreadCache,
}

impl ThreadStateManager {
    /// Create a manager with every slot unseen and no active thread
    #[must_use]
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(MAX_THREADS);
        slots.resize_with(MAX_THREADS, Slot::default);
        Self { slots, active: ActiveThreadCache::default() }
    }

    /// Thread currently loaded into the active cache
    #[must_use]
    pub fn current_thread(&self) -> ThreadId {
        self.active.tid
    }

    #[must_use]
    pub fn active_cache(&self) -> &ActiveThreadCache {
        &self.active
    }

    /// State of the active thread, `None` when detached
    #[must_use]
    pub fn active_state(&self) -> Option<&ThreadState> {
        self.active.tid.is_valid().then_some(&self.active.state)
    }

    /// Mutable state of the active thread, `None` when detached
    pub fn active_state_mut(&mut self) -> Option<&mut ThreadState> {
        if self.active.tid.is_valid() {
            Some(&mut self.active.state)
        } else {
            None
        }
    }

    /// Number of threads that have ever been switched to
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.slots.iter().filter(|slot| !matches!(slot, Slot::Unseen)).count()
    }

    /// Make `tid` the active thread
    ///
    /// Saves the active state into its slot, then loads (or creates) the
    /// state of `tid`. Switching to the current thread is a no-op; switching
    /// to `ThreadId::INVALID` only saves.
    ///
    /// # Errors
    /// [`TrackerError::ThreadIdOutOfRange`] if `tid` exceeds the host's
    /// thread table, [`TrackerError::ThreadStateCorrupted`] if the slot table
    /// disagrees with the cache.
    pub fn switch_to(&mut self, tid: ThreadId) -> Result<(), TrackerError> {
        if tid == self.active.tid {
            return Ok(());
        }
        if !tid.in_bounds() {
            return Err(TrackerError::ThreadIdOutOfRange(tid));
        }

        debug!(">> thread {tid} (was {})", self.active.tid);

        self.save_active()?;

        if tid.is_valid() {
            let state = match mem::replace(&mut self.slots[tid.as_index()], Slot::Active) {
                Slot::Unseen => ThreadState::new(),
                Slot::Suspended(state) => state,
                Slot::Active => return Err(TrackerError::ThreadStateCorrupted(tid)),
            };
            self.active.state = state;
        }
        self.active.tid = tid;

        Ok(())
    }

    /// Flush the active state back into its slot
    ///
    /// Afterwards the cache is detached (`current_thread()` is
    /// `ThreadId::INVALID`); the next `switch_to` reloads whichever thread
    /// the host reports. Used right before shutdown drains the logs.
    ///
    /// # Errors
    /// [`TrackerError::ThreadStateCorrupted`] if the active slot is not
    /// marked active.
    pub fn sync_active(&mut self) -> Result<(), TrackerError> {
        self.save_active()?;
        self.active.tid = ThreadId::INVALID;
        Ok(())
    }

    /// Visit every thread that has a state, in thread id order
    ///
    /// Each thread is switched in before its visit so the visitor sees the
    /// materialized active state. The thread active before the call is
    /// restored afterwards, also when the visitor fails.
    ///
    /// # Errors
    /// Propagates the first visitor or switch error.
    pub fn for_each_thread<F, E>(&mut self, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(ThreadId, &ThreadState) -> Result<(), E>,
        E: From<TrackerError>,
    {
        let orig_tid = self.active.tid;

        #[allow(clippy::cast_possible_truncation)]
        let result = (1..self.slots.len()).try_for_each(|idx| {
            if matches!(self.slots[idx], Slot::Unseen) {
                return Ok(());
            }
            let tid = ThreadId(idx as u32);
            self.switch_to(tid)?;
            visitor(tid, &self.active.state)
        });

        self.switch_to(orig_tid)?;
        result
    }

    /// Discard every thread state at once
    ///
    /// Returns the number of threads torn down.
    pub fn destroy(self) -> usize {
        let count = self.thread_count();
        debug!("Destroying {count} thread states");
        count
    }

    fn save_active(&mut self) -> Result<(), TrackerError> {
        let tid = self.active.tid;
        if !tid.is_valid() {
            return Ok(());
        }

        let slot = &mut self.slots[tid.as_index()];
        if !matches!(slot, Slot::Active) {
            return Err(TrackerError::ThreadStateCorrupted(tid));
        }
        *slot = Slot::Suspended(mem::take(&mut self.active.state));
        Ok(())
    }
}

impl Default for ThreadStateManager {
    fn default() -> Self {
        Self::new()
    }
}
