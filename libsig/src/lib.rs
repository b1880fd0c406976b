//! # libsig - Region-Transition Tracker
//!
//! libsig observes a program while an instrumentation host runs it and
//! records, per thread, every point where control crosses between the
//! program's own code (**inbound**) and everything else, mostly shared
//! libraries (**outbound**). The result is a compact signature of how the
//! program uses its libraries.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Instrumentation Host (or trace replay)             │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ start / run / exec / signal notifications
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Tracker (this crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │  Range Set   │──▶│  Transition  │──▶│ Thread State │         │
//! │  │ (classify)   │   │   Recorder   │   │   Manager    │         │
//! │  └──────────────┘   └──────┬───────┘   └──────┬───────┘         │
//! │                            │                  │                 │
//! │                            ▼                  ▼                 │
//! │                     ┌──────────────┐   ┌──────────────┐         │
//! │                     │ Symbol Pool  │──▶│  Log Writer  │         │
//! │                     │  (interning) │   │ (records.out)│         │
//! │                     └──────────────┘   └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`classification`]: inbound address ranges and region classification
//! - [`symbolization`]: the symbol pool, bootstrap symbol files and
//!   DWARF/ELF name lookup
//! - [`tracking`]: per-thread state, the active-thread cache and the
//!   transition recorder
//! - [`export`]: the records file writer
//! - [`tracker`]: the lifecycle façade tying the components together
//! - [`host`]: the trait an instrumentation host implements
//! - [`replay`]: a host that replays recorded execution traces
//! - [`config`], [`cli`], [`preflight`]: configuration and the binary's
//!   front end
//! - [`domain`]: core domain types (`Address`, `ThreadId`, `Region`) and errors
//!
//! ## Records File
//!
//! ```text
//! # Thread: 1
//! 0x7ffff7e4a2b0,puts,1
//! 0x7ffff7e52e10,???,3
//! ```
//!
//! The last column is the hit count, or the region tag when both directions
//! are recorded.

pub mod classification;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod host;
pub mod preflight;
pub mod replay;
pub mod symbolization;
pub mod tracker;
pub mod tracking;

pub use host::Host;
pub use tracker::{FinishReport, Tracker};
