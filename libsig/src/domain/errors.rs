//! Structured error types for libsig
//!
//! Using thiserror for automatic Display implementation and error chaining.
//!
//! Every variant of [`TrackerError`] is fatal for the run: configuration
//! errors abort startup or shutdown, integrity violations mean the tracker's
//! bookkeeping is corrupted. Resolution misses are not errors at all; they
//! are recorded with the unknown-name placeholder.

use super::types::{Address, ThreadId};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Range at {0} has zero length")]
    ZeroLengthRange(Address),

    #[error("Null address is not a valid code address")]
    ZeroAddress,

    #[error("Invalid bound specification '{spec}': {reason}")]
    InvalidBoundSpec { spec: String, reason: String },

    #[error("Failed to open symbols file {}: {source}", path.display())]
    SymbolFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open records file {}: {source}", path.display())]
    OutputUnopenable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No inbound range configured and the main program's code segment could not be found")]
    NoDefaultRange,

    #[error("Thread {0} is outside the host's thread table")]
    ThreadIdOutOfRange(ThreadId),

    #[error("Thread state table corrupted at thread {0}")]
    ThreadStateCorrupted(ThreadId),

    #[error("Symbol pool leaked {remaining} entries on teardown")]
    PoolLeak { remaining: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Trace line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length_display() {
        let err = TrackerError::ZeroLengthRange(Address(0x1000));
        assert_eq!(err.to_string(), "Range at 0x1000 has zero length");
    }

    #[test]
    fn test_symbol_file_error_keeps_path() {
        let err = TrackerError::SymbolFileUnreadable {
            path: PathBuf::from("/nonexistent/names.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nonexistent/names.txt"));
    }

    #[test]
    fn test_replay_parse_error() {
        let err = ReplayError::Parse { line: 7, reason: "unknown directive 'jump'".to_string() };
        assert!(err.to_string().contains("line 7"));
        assert!(err.to_string().contains("jump"));
    }
}
