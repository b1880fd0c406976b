//! Records export
//!
//! Serializes every thread's transition log to the records file at shutdown.

pub mod records_file;

pub use records_file::{dump_records, open_output, write_thread_section};
