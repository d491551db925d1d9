//! # probe-reader - Main Entry Point
//!
//! Loads an eBPF object, attaches the programs its schema names, and polls the
//! decoded events until Ctrl+C or the duration limit:
//! - **Summary** (default): counters on exit
//! - **JSON** (`--json`): one JSON line per decoded event on stdout

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;
use std::time::{Duration, Instant};

use probe_reader::backend::{attach_probes, init_ebpf_logger, load_ebpf_object, AyaBackend};
use probe_reader::cli::Args;
use probe_reader::domain::RingLayout;
use probe_reader::event::ProbeEvent;
use probe_reader::preflight::run_preflight_checks;
use probe_reader::reader::{EventAssembler, ProbeReaderService, StagingQueue};
use probe_reader::schema::ProbeSchema;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") || msg.contains("requires root") {
        EXIT_NOPERM
    } else if msg.contains("invalid schema") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    let schema = ProbeSchema::from_file(&args.schema)
        .with_context(|| format!("Failed to load schema {}", args.schema.display()))?;

    run_preflight_checks(&args.object)?;

    if !quiet {
        eprintln!("probe-reader v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("object: {}", args.object.display());
        eprintln!("probe: {} ({} events)", schema.name, schema.event_count());
    }

    // ── Load eBPF and open the maps before anything can fire ───────────
    let mut bpf = load_ebpf_object(&args.object)?;
    init_ebpf_logger(&mut bpf);

    let backend = AyaBackend::new(&mut bpf, &schema.name, &args.events_map, &args.data_map)?;
    let attached = attach_probes(&mut bpf, &schema)?;

    if !quiet {
        eprintln!("attached: {attached}");
    }

    // ── Start the decode thread ────────────────────────────────────────
    let queue = StagingQueue::new();
    let assembler = EventAssembler::new(schema, RingLayout::new(args.ring_capacity));
    let service = ProbeReaderService::new(backend, assembler, queue.clone())
        .spawn()
        .context("Failed to start probe reader thread")?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let started = Instant::now();
    let duration_limit =
        if args.duration > 0 { Some(Duration::from_secs(args.duration)) } else { None };
    let mut last_status_time = Instant::now();
    let mut received = 0usize;
    let mut exit_reason = "interrupted";

    // Host poll loop
    loop {
        if let Some(limit) = duration_limit {
            if started.elapsed() >= limit {
                exit_reason = "duration limit reached";
                break;
            }
        }

        if received == 0 && last_status_time.elapsed() > Duration::from_secs(10) {
            info!("Still waiting for events... (no events received yet)");
            last_status_time = Instant::now();
        }

        let drain_queue = queue.clone();
        let mut drained = tokio::task::spawn_blocking(move || drain_queue.drain_events());

        tokio::select! {
            events = &mut drained => {
                let events = events.context("Event drain task failed")?;
                received += print_events(&events, args.json)?;
            }
            _ = &mut ctrl_c => {
                // The drain in flight may already hold events
                let events = drained.await.context("Event drain task failed")?;
                received += print_events(&events, args.json)?;
                break;
            }
        }
    }

    let stats = service.join().map_err(|_| anyhow!("Probe reader thread panicked"))?;

    // Batches staged by the last cycle before the service stopped
    received += print_events(&queue.drain_events_timeout(Duration::ZERO), args.json)?;

    if !quiet {
        eprintln!(
            "\n{}: {:.1}s, {} identifiers, {} events (read failures: {}, broken: {}, invalid type: {}, unknown parameter: {})",
            exit_reason,
            started.elapsed().as_secs_f64(),
            stats.processed,
            received,
            stats.read_failures,
            stats.broken_event_type,
            stats.invalid_event_type,
            stats.unknown_parameter,
        );
    }

    Ok(())
}

/// Print drained events as JSON lines when requested; returns how many there were
fn print_events(events: &[ProbeEvent], json: bool) -> Result<usize> {
    if json {
        for event in events {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(events.len())
}
