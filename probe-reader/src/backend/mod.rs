//! Probe backends
//!
//! A backend owns the kernel side of the pipeline: it attaches the probes,
//! exposes the per-CPU event data table, and delivers the identifiers the
//! kernel publishes for every finished event. The reader only sees it through
//! the two traits below.
//!
//! - [`memory`]: in-memory table and scripted identifier batches
//! - [`perf_events`]: aya `PerCpuArray` table and `AsyncPerfEventArray` identifiers
//! - [`ebpf_setup`]: loading an eBPF object and attaching its programs
//! - [`cpu_utils`]: online CPU discovery for per-CPU perf buffers

pub mod cpu_utils;
pub mod ebpf_setup;
pub mod memory;
pub mod perf_events;

use crate::domain::{BackendError, RawEventId, ReadError, RingIndex};

pub use cpu_utils::online_cpus;
pub use ebpf_setup::{attach_probes, init_ebpf_logger, load_ebpf_object};
pub use memory::{MemoryBackend, MemoryTable};
pub use perf_events::{AyaBackend, PerCpuEventTable};

/// Row accessor for the per-CPU event data table
pub trait EventDataTable {
    /// Read every CPU column of row `index`
    ///
    /// # Errors
    /// Returns [`ReadError::Backend`] when the backend cannot read the row
    fn read_row(&self, index: RingIndex) -> Result<Vec<u64>, ReadError>;
}

impl<T: EventDataTable + ?Sized> EventDataTable for &T {
    fn read_row(&self, index: RingIndex) -> Result<Vec<u64>, ReadError> {
        (**self).read_row(index)
    }
}

/// Source of raw event identifiers and the table they point into
pub trait ProbeBackend {
    type Table: EventDataTable;

    /// Block until identifiers are available or a backend-defined wake-up
    /// happens; an empty batch is a valid result
    ///
    /// # Errors
    /// Returns an error when the identifier stream is gone for good
    fn fetch_event_ids(&mut self) -> Result<Vec<RawEventId>, BackendError>;

    fn event_data_table(&self) -> &Self::Table;

    /// Probe name used in log messages
    fn name(&self) -> &str;
}
