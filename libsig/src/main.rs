//! # libsig - Main Entry Point
//!
//! Two subcommands:
//! - **replay** (`libsig replay run.trace --target ./app`): feed a recorded
//!   execution trace through the tracker and write the records file
//! - **symbols** (`libsig symbols ./app -o app.syms`): produce a bootstrap
//!   symbol file for `--symbols`

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use libsig::cli::{Args, Command, ReplayArgs, SymbolsArgs};
use libsig::config::{parse_bound_spec, RecordMode, TrackerConfig};
use libsig::preflight::{run_preflight_checks, PreflightInputs};
use libsig::replay::{parse_trace, replay, ReplayHost};
use libsig::symbolization::{read_memory_maps, text_section, write_symbol_names, Symbolizer};
use libsig::Tracker;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            // --help and --version also come through here
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logger(args.verbose);

    std::process::exit(match run(args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

/// Default filter from `-v` count; `RUST_LOG` still wins
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Replay(replay_args) => run_replay(&replay_args),
        Command::Symbols(symbols_args) => run_symbols(&symbols_args),
    }
}

fn run_replay(args: &ReplayArgs) -> Result<()> {
    run_preflight_checks(&PreflightInputs {
        trace: Some(&args.trace),
        target: args.target.as_deref(),
        symbols: args.symbols.as_deref(),
        records: args.records.as_deref().map(Path::new),
    })?;

    let config = TrackerConfig {
        bound: args.bound.as_deref().map(parse_bound_spec).transpose()?,
        records_file: args.records.clone(),
        symbols_file: args.symbols.clone(),
        mode: RecordMode::new(args.record.into(), args.coalesce),
    };

    let host = build_host(args)?;

    let trace = File::open(&args.trace)
        .with_context(|| format!("Failed to open trace {}", args.trace.display()))?;
    let events = parse_trace(BufReader::new(trace))?;
    info!("Loaded {} trace events", events.len());

    let mut tracker = Tracker::new(&config)?;
    let stats = replay(&mut tracker, &host, events)?;
    let report = tracker.finish(&host)?;

    info!(
        "{} events, {} blocks, {} signals; {} threads, {} symbols",
        stats.events, stats.executed, stats.signals, report.threads, report.symbols
    );
    if let Some(path) = &report.output {
        println!("saved: {} ({} records)", path.display(), report.records_written);
    }

    Ok(())
}

/// Set up the replay host from `--target` and `--maps`
fn build_host(args: &ReplayArgs) -> Result<ReplayHost> {
    let mut host = ReplayHost::new();

    let Some(target) = &args.target else {
        if args.maps.is_some() {
            warn!("--maps ignored without --target");
        }
        return Ok(host);
    };

    match Symbolizer::new(target) {
        Ok(symbolizer) => host = host.with_symbolizer(symbolizer),
        Err(e) => warn!("No symbol names from {}: {e:#}", target.display()),
    }

    if let Some(maps) = &args.maps {
        let binary = target.to_string_lossy();
        host = host.with_layout(read_memory_maps(maps, &binary)?);
    } else if let Some(segment) = text_section(target)? {
        host = host.with_code_segment(segment);
    }

    Ok(host)
}

fn run_symbols(args: &SymbolsArgs) -> Result<()> {
    let symbolizer = Symbolizer::new(&args.binary)
        .with_context(|| format!("Failed to load symbols from {}", args.binary.display()))?;
    let entries = symbolizer.symbols().iter().map(|sym| (sym.addr, sym.name.as_str()));

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let written = write_symbol_names(BufWriter::new(writer), entries)?;

    info!("Wrote {written} symbols");
    Ok(())
}
