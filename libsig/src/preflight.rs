//! Pre-flight checks for libsig
//!
//! Validates the inputs of a replay before any work is done, so a bad path
//! surfaces as one clear message instead of a failure halfway through.

use anyhow::{bail, Context, Result};
use log::warn;
use object::{Object, ObjectSection};
use std::fs::File;
use std::path::Path;

/// Inputs to check before replaying a trace
#[derive(Debug, Default)]
pub struct PreflightInputs<'a> {
    pub trace: Option<&'a Path>,
    pub target: Option<&'a Path>,
    pub symbols: Option<&'a Path>,
    pub records: Option<&'a Path>,
}

/// Run all pre-flight checks
///
/// # Errors
/// Returns an error describing the first unusable input
pub fn run_preflight_checks(inputs: &PreflightInputs<'_>) -> Result<()> {
    if let Some(trace) = inputs.trace {
        check_file_exists(trace, "Trace file")?;
    }
    if let Some(target) = inputs.target {
        check_file_exists(target, "Binary")?;
        check_debug_symbols(target)?;
    }
    if let Some(symbols) = inputs.symbols {
        check_readable(symbols)?;
    }
    if let Some(records) = inputs.records {
        check_output_dir(records)?;
    }
    Ok(())
}

/// Check that `path` exists and is a regular file
///
/// # Errors
/// Returns an error naming `what` if the path is missing or not a file
pub fn check_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!(
            "{what} not found: {}\n\n\
             Make sure the path is correct and the file exists.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!("Not a file: {}", path.display());
    }
    Ok(())
}

/// Warn when the binary cannot provide function names
fn check_debug_symbols(target: &Path) -> Result<()> {
    let file_data = std::fs::read(target)
        .with_context(|| format!("Failed to read binary: {}", target.display()))?;

    let Ok(obj) = object::File::parse(&*file_data) else {
        // Not an object file; symbolization will report it
        return Ok(());
    };

    let has_debug_info = obj.section_by_name(".debug_info").is_some_and(|s| s.size() > 0);
    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);

    if !has_debug_info && !has_symtab {
        warn!("binary stripped, records will show ??? for most names");
    } else if !has_debug_info {
        warn!("no DWARF debug info, names come from the symbol table only");
    }

    Ok(())
}

/// Check that the bootstrap symbol file can be opened
fn check_readable(path: &Path) -> Result<()> {
    File::open(path)
        .map(drop)
        .with_context(|| format!("Cannot read symbols file {}", path.display()))
}

/// Check that the records file's directory exists
///
/// `records` may still contain a `%p` placeholder; only the parent matters.
fn check_output_dir(records: &Path) -> Result<()> {
    match records.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            bail!("Records directory does not exist: {}", dir.display())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_fails() {
        let inputs =
            PreflightInputs { target: Some(Path::new("/nonexistent/bin")), ..Default::default() };
        let err = run_preflight_checks(&inputs).unwrap_err();
        assert!(err.to_string().contains("Binary not found"));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let inputs = PreflightInputs { trace: Some(Path::new("/")), ..Default::default() };
        assert!(run_preflight_checks(&inputs).is_err());
    }

    #[test]
    fn test_output_dir_checks() {
        assert!(check_output_dir(Path::new("records-%p.out")).is_ok());
        assert!(check_output_dir(Path::new("/nonexistent-dir/records.out")).is_err());
    }

    #[test]
    fn test_nothing_to_check() {
        assert!(run_preflight_checks(&PreflightInputs::default()).is_ok());
    }
}
