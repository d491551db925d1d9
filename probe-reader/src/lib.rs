//! # probe-reader - Syscall Event Decoder for eBPF Per-CPU Tables
//!
//! Kernel probes write each syscall event as a run of 64-bit words into a
//! per-CPU array, then publish a 32-bit identifier pointing at the first word.
//! This crate turns those identifiers back into typed events and hands them
//! to a host that polls on its own schedule.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   eBPF Programs (Kernel)                        │
//! │  • Tracepoints / kprobes encode events into EVENT_DATA          │
//! │  • Identifiers published through the EVENTS perf array          │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ identifiers + per-CPU slots
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  probe-reader (This Crate)                      │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │   Backend    │──▶│   Service    │──▶│   Staging    │──▶ host │
//! │  │ (aya/memory) │   │    Loop      │   │    Queue     │        │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘        │
//! │                            ▼                                    │
//! │                     ┌──────────────┐                            │
//! │                     │    Event     │  schema-driven decoding    │
//! │                     │  Assembler   │  over a SlotCursor         │
//! │                     └──────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`reader`]: slot cursor, decoders, event assembler, staging queue, service loop
//! - [`backend`]: `ProbeBackend`/`EventDataTable` traits, in-memory and aya backends
//! - [`schema`]: JSON probe schemas (event descriptors and parameter types)
//! - [`event`]: decoded [`event::ProbeEvent`] values
//! - [`domain`]: newtypes and error types
//! - [`cli`]: command-line arguments
//! - [`preflight`]: privilege and kernel checks before loading eBPF
//!
//! ## Typical Usage
//!
//! ```bash
//! sudo RUST_LOG=info ./probe-reader --object execve.o --schema execve.json --json
//! ```

pub mod backend;
pub mod cli;
pub mod domain;
pub mod event;
pub mod preflight;
pub mod reader;
pub mod schema;
