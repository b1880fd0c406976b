//! Execution trace format
//!
//! A trace is a line-oriented log of what an instrumentation host would
//! have reported:
//!
//! ```text
//! # comment
//! pid 4242              process id for %p in the records path
//! start                 main program code is about to run
//! run 2                 host switched to thread 2
//! exec 2 0x401126       thread 2 executed the block at 0x401126
//! signal 2              signal handler entered on thread 2
//! sigreturn 2           signal handler returned on thread 2
//! ```

use std::io::BufRead;

use crate::domain::{Address, ReplayError, ThreadId};

/// One host notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Pid(u32),
    Start,
    Run(ThreadId),
    Exec(ThreadId, Address),
    Signal(ThreadId),
    SigReturn(ThreadId),
}

fn parse_error(line: usize, reason: impl Into<String>) -> ReplayError {
    ReplayError::Parse { line, reason: reason.into() }
}

fn parse_tid(field: Option<&str>, line: usize) -> Result<ThreadId, ReplayError> {
    let field = field.ok_or_else(|| parse_error(line, "missing thread id"))?;
    field
        .parse::<u32>()
        .map(ThreadId)
        .map_err(|_| parse_error(line, format!("invalid thread id '{field}'")))
}

fn parse_addr(field: Option<&str>, line: usize) -> Result<Address, ReplayError> {
    let field = field.ok_or_else(|| parse_error(line, "missing address"))?;
    let digits = field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")).unwrap_or(field);
    u64::from_str_radix(digits, 16)
        .map(Address)
        .map_err(|_| parse_error(line, format!("invalid address '{field}'")))
}

/// Parse a single trace line
///
/// Returns `Ok(None)` for blank lines and comments. `line` is the 1-based
/// line number used in error messages.
///
/// # Errors
/// Returns [`ReplayError::Parse`] for unknown keywords, missing or malformed
/// fields and trailing garbage.
pub fn parse_event(text: &str, line: usize) -> Result<Option<TraceEvent>, ReplayError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let mut fields = text.split_whitespace();
    let Some(keyword) = fields.next() else {
        return Ok(None);
    };

    let event = match keyword {
        "pid" => {
            let field = fields.next().ok_or_else(|| parse_error(line, "missing pid"))?;
            let pid = field
                .parse::<u32>()
                .map_err(|_| parse_error(line, format!("invalid pid '{field}'")))?;
            TraceEvent::Pid(pid)
        }
        "start" => TraceEvent::Start,
        "run" => TraceEvent::Run(parse_tid(fields.next(), line)?),
        "exec" => {
            let tid = parse_tid(fields.next(), line)?;
            TraceEvent::Exec(tid, parse_addr(fields.next(), line)?)
        }
        "signal" => TraceEvent::Signal(parse_tid(fields.next(), line)?),
        "sigreturn" => TraceEvent::SigReturn(parse_tid(fields.next(), line)?),
        other => return Err(parse_error(line, format!("unknown event '{other}'"))),
    };

    if let Some(extra) = fields.next() {
        return Err(parse_error(line, format!("unexpected field '{extra}'")));
    }

    Ok(Some(event))
}

/// Parse a whole trace
///
/// # Errors
/// Returns the first parse error, or [`ReplayError::Io`] if reading fails
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<TraceEvent>, ReplayError> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        if let Some(event) = parse_event(&line?, idx + 1)? {
            events.push(event);
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_events() {
        let trace = "\
# demo trace
pid 4242

start
run 2
exec 2 0x401126
exec 2 7fff0010
signal 2
sigreturn 2
";
        let events = parse_trace(trace.as_bytes()).unwrap();
        assert_eq!(
            events,
            vec![
                TraceEvent::Pid(4242),
                TraceEvent::Start,
                TraceEvent::Run(ThreadId(2)),
                TraceEvent::Exec(ThreadId(2), Address(0x40_1126)),
                TraceEvent::Exec(ThreadId(2), Address(0x7fff_0010)),
                TraceEvent::Signal(ThreadId(2)),
                TraceEvent::SigReturn(ThreadId(2)),
            ]
        );
    }

    #[test]
    fn test_parse_error_reports_line() {
        let trace = "start\nexec 1\n";
        match parse_trace(trace.as_bytes()) {
            Err(ReplayError::Parse { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("address"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_and_trailing() {
        assert!(matches!(parse_event("jump 1", 1), Err(ReplayError::Parse { .. })));
        assert!(matches!(parse_event("run 1 2", 1), Err(ReplayError::Parse { .. })));
        assert!(matches!(parse_event("run one", 1), Err(ReplayError::Parse { .. })));
    }
}
