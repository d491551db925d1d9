//! # eBPF Object Loading and Attachment
//!
//! Loads a compiled eBPF object and attaches the programs named by the probe
//! schema.
//!
//! ## Functions
//!
//! - [`load_ebpf_object()`] - Load eBPF bytecode from an object file
//! - [`init_ebpf_logger()`] - Forward `aya-log` output from the kernel programs
//! - [`attach_probes()`] - Attach every program referenced by the schema
//!
//! ## Attachment Points
//!
//! - **Tracepoint** probes: `category/target` (e.g. `syscalls/sys_enter_execve`)
//! - **Kprobe** probes: kernel function `target` at offset 0

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use aya::{
    programs::{KProbe, TracePoint},
    Ebpf,
};
use aya_log::EbpfLogger;
use log::{info, warn};

use crate::schema::{ProbeKind, ProbeSchema};

/// Load the eBPF object emitting events for the schema
///
/// # Errors
/// Returns an error if the object cannot be read or rejected by the kernel
pub fn load_ebpf_object(path: impl AsRef<Path>) -> Result<Ebpf> {
    let path = path.as_ref();
    let bpf = Ebpf::load_file(path)
        .with_context(|| format!("Failed to load eBPF object {}", path.display()))?;
    Ok(bpf)
}

/// Initialize eBPF logger
pub fn init_ebpf_logger(bpf: &mut Ebpf) {
    if let Err(e) = EbpfLogger::init(bpf) {
        warn!("Failed to initialize eBPF logger: {e}");
    }
}

/// Attach the program of every event that declares an attach point
///
/// Programs shared by several events are loaded once and attached once per
/// event. Returns the number of attachments made.
///
/// # Errors
/// Returns an error if a program is missing, has the wrong type, or fails to
/// load or attach
pub fn attach_probes(bpf: &mut Ebpf, schema: &ProbeSchema) -> Result<usize> {
    let mut loaded = HashSet::new();
    let mut attached = 0;

    for event in &schema.events {
        let (Some(attach), Some(target)) = (&event.attach, event.attach_target()) else {
            continue;
        };

        let program = bpf
            .program_mut(&attach.program)
            .with_context(|| format!("{} program not found", attach.program))?;

        match schema.kind {
            ProbeKind::Tracepoint => {
                let category = attach.category.as_deref().with_context(|| {
                    format!("Tracepoint event {} has no category", event.name)
                })?;
                let program: &mut TracePoint = program.try_into()?;
                if loaded.insert(attach.program.clone()) {
                    program.load()?;
                }
                program
                    .attach(category, target)
                    .with_context(|| format!("Failed to attach {category}/{target}"))?;
                info!("✓ Attached tracepoint: {category}/{target}");
            }
            ProbeKind::Kprobe => {
                let program: &mut KProbe = program.try_into()?;
                if loaded.insert(attach.program.clone()) {
                    program.load()?;
                }
                program
                    .attach(target, 0)
                    .with_context(|| format!("Failed to attach kprobe {target}"))?;
                info!("✓ Attached kprobe: {target}");
            }
        }
        attached += 1;
    }

    if attached == 0 {
        warn!("Schema {} declares no attach points; expecting events from elsewhere", schema.name);
    }

    Ok(attached)
}
