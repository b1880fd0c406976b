//! Records file writer
//!
//! One section per thread that ever ran, in thread id order:
//!
//! ```text
//! # Thread: 1
//! 0x401126,main,inbound
//! 0x7ffff7e4a2b0,puts,outbound
//! # Thread: 2
//! 0x7ffff7e52e10,???,1
//! ```
//!
//! The third column is the region tag in tagged mode and the hit count in
//! count mode. Coalesced counts are only written as numbers when coalescing
//! is enabled; otherwise each hit gets its own line with count 1.

use libsig_common::UNKNOWN_SYMBOL_NAME;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::RecordMode;
use crate::domain::{ThreadId, TrackerError};
use crate::symbolization::SymbolPool;
use crate::tracking::{ThreadState, ThreadStateManager};

/// Open the records file, truncating an existing one
///
/// A missing file is created with owner-only permissions.
///
/// # Errors
/// Returns [`TrackerError::OutputUnopenable`] if both attempts fail.
pub fn open_output(path: &Path) -> Result<File, TrackerError> {
    match OpenOptions::new().write(true).truncate(true).open(path) {
        Ok(file) => Ok(file),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut options = OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            options
                .open(path)
                .map_err(|source| TrackerError::OutputUnopenable { path: path.to_path_buf(), source })
        }
        Err(source) => Err(TrackerError::OutputUnopenable { path: path.to_path_buf(), source }),
    }
}

/// Write one thread's section
///
/// Returns the number of record lines written.
///
/// # Errors
/// Returns any error from the underlying writer
pub fn write_thread_section<W: Write>(
    writer: &mut W,
    tid: ThreadId,
    state: &ThreadState,
    pool: &SymbolPool,
    mode: RecordMode,
) -> io::Result<usize> {
    writeln!(writer, "# Thread: {tid}")?;

    let mut lines = 0;
    for record in &state.log {
        let addr = pool.address_of(record.symbol);
        let name = pool.name_of(record.symbol).unwrap_or(UNKNOWN_SYMBOL_NAME);

        if mode.is_tagged() {
            for _ in 0..record.count {
                writeln!(writer, "{addr},{name},{}", record.region)?;
                lines += 1;
            }
        } else if mode.coalesce {
            writeln!(writer, "{addr},{name},{}", record.count)?;
            lines += 1;
        } else {
            for _ in 0..record.count {
                writeln!(writer, "{addr},{name},1")?;
                lines += 1;
            }
        }
    }

    Ok(lines)
}

/// Dump every thread's log to `path`
///
/// Returns the number of record lines written.
///
/// # Errors
/// Returns [`TrackerError::OutputUnopenable`] if the file cannot be opened,
/// [`TrackerError::Io`] for write failures and any thread switching error.
pub fn dump_records(
    path: &Path,
    threads: &mut ThreadStateManager,
    pool: &SymbolPool,
    mode: RecordMode,
) -> Result<usize, TrackerError> {
    let mut writer = BufWriter::new(open_output(path)?);
    let mut total = 0;

    threads.for_each_thread(|tid, state| -> Result<(), TrackerError> {
        let lines = write_thread_section(&mut writer, tid, state, pool, mode)?;
        debug!("Thread {tid}: {lines} records");
        total += lines;
        Ok(())
    })?;

    writer.flush()?;
    info!("Wrote {total} records to {}", path.display());

    Ok(total)
}
