//! Probe event reader
//!
//! Decodes events out of the per-CPU event data table and stages them for the
//! host:
//! - `slot_reader`: cursor over one CPU column of the table
//! - `decoders`: integers, fixed buffers and string lists built from slots
//! - `event_assembler`: header validation and schema-driven parameter decoding
//! - `staging`: batch hand-off with a bounded consumer wait
//! - `service`: fetch/decode loop and its lifecycle handle

pub mod decoders;
pub mod event_assembler;
pub mod service;
pub mod slot_reader;
pub mod staging;

pub use event_assembler::{EventAssembler, EventStats};
pub use service::{ProbeReaderService, ServiceHandle, ServiceState};
pub use slot_reader::SlotCursor;
pub use staging::{StagingQueue, DRAIN_TIMEOUT};
