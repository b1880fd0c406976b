//! CLI argument definitions

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::RecordDirection;

#[derive(Parser)]
#[command(
    name = "libsig",
    about = "Record transitions between a program's own code and its libraries",
    after_help = "\
EXAMPLES:
    libsig replay run.trace --target ./app --records out-%p.sig
    libsig replay run.trace --bound 0x401000+4096 --record both
    libsig symbols ./app -o app.syms"
)]
pub struct Args {
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Feed a recorded execution trace through the tracker
    Replay(ReplayArgs),
    /// Write a bootstrap symbol file from a binary's symbol table
    Symbols(SymbolsArgs),
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    /// Execution trace to replay
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Binary the trace was recorded from (for names and the default range)
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// /proc/<pid>/maps snapshot of the traced process
    #[arg(long, value_name = "FILE")]
    pub maps: Option<PathBuf>,

    /// Inbound range as addr[+length] (hex address, decimal length)
    #[arg(long, value_name = "SPEC")]
    pub bound: Option<String>,

    /// Records output path; %p expands to the process id
    #[arg(long, value_name = "TEMPLATE")]
    pub records: Option<String>,

    /// Bootstrap symbol file of "0x<addr>,<name>" lines
    #[arg(long, value_name = "FILE")]
    pub symbols: Option<PathBuf>,

    /// Which transitions to record
    #[arg(long, value_enum, default_value_t = DirectionArg::Outbound)]
    pub record: DirectionArg,

    /// Merge consecutive records of the same address
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub coalesce: bool,
}

#[derive(clap::Args)]
pub struct SymbolsArgs {
    /// Binary to read symbols from
    #[arg(value_name = "BINARY")]
    pub binary: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Inbound,
    Outbound,
    Both,
}

impl From<DirectionArg> for RecordDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Inbound => RecordDirection::Inbound,
            DirectionArg::Outbound => RecordDirection::Outbound,
            DirectionArg::Both => RecordDirection::Both,
        }
    }
}
