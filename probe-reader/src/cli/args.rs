//! CLI argument definitions

use clap::Parser;
use probe_reader_common::EVENT_MAP_SIZE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "probe-reader",
    about = "Decode syscall events from an eBPF per-CPU event data table",
    after_help = "\
EXAMPLES:
    sudo probe-reader --object execve.o --schema execve.json          Print a summary
    sudo probe-reader --object execve.o --schema execve.json --json   Print every event"
)]
pub struct Args {
    /// Compiled eBPF object emitting the events
    #[arg(long, value_name = "FILE")]
    pub object: PathBuf,

    /// JSON schema describing the object's events
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Perf event array carrying event identifiers
    #[arg(long, default_value = "EVENTS")]
    pub events_map: String,

    /// Per-CPU array holding event data
    #[arg(long, default_value = "EVENT_DATA")]
    pub data_map: String,

    /// Number of rows in the event data table
    #[arg(long, default_value_t = EVENT_MAP_SIZE,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub ring_capacity: u32,

    /// Stop after N seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Print every decoded event as a JSON line
    #[arg(long)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
