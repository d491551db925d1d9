//! Service Loop
//!
//! Fetches identifier batches from the backend, decodes them, and stages the
//! result for the host. The stop flag is only checked between fetch cycles, so
//! a stop request takes effect after at most one fetch-and-decode round.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{error, info};

use super::event_assembler::{EventAssembler, EventStats};
use super::staging::StagingQueue;
use crate::backend::ProbeBackend;
use crate::domain::BackendError;

/// Pause after a failed fetch before trying again
pub const FETCH_ERROR_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopping,
}

/// Owns the decode path: backend, assembler and the producer side of the queue
pub struct ProbeReaderService<B: ProbeBackend> {
    backend: B,
    assembler: EventAssembler,
    queue: StagingQueue,
}

impl<B: ProbeBackend> ProbeReaderService<B> {
    #[must_use]
    pub fn new(backend: B, assembler: EventAssembler, queue: StagingQueue) -> Self {
        Self { backend, assembler, queue }
    }

    /// One fetch-and-decode cycle; returns the number of events staged
    ///
    /// # Errors
    /// Returns an error if the backend could not deliver identifiers
    pub fn run_once(&mut self) -> Result<usize, BackendError> {
        let ids = self.backend.fetch_event_ids()?;
        if ids.is_empty() {
            return Ok(0);
        }

        let events = self.assembler.process_batch(self.backend.event_data_table(), &ids);
        let staged = events.len();
        self.queue.push_batch(events);
        Ok(staged)
    }

    /// Run cycles until `stop` is set, then return the accumulated counters
    ///
    /// Backend errors are logged and retried after [`FETCH_ERROR_BACKOFF`];
    /// nothing but the stop flag ends the loop.
    pub fn run(&mut self, stop: &AtomicBool) -> EventStats {
        info!("Probe reader started for {}", self.backend.name());

        while !stop.load(Ordering::Acquire) {
            if let Err(e) = self.run_once() {
                error!("Failed to fetch events from {}: {e}", self.backend.name());
                std::thread::sleep(FETCH_ERROR_BACKOFF);
            }
        }

        info!("Probe reader stopping for {}", self.backend.name());
        self.assembler.stats
    }

    #[must_use]
    pub fn stats(&self) -> EventStats {
        self.assembler.stats
    }
}

impl<B: ProbeBackend + Send + 'static> ProbeReaderService<B> {
    /// Run the service on its own thread
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned
    pub fn spawn(mut self) -> std::io::Result<ServiceHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = std::thread::Builder::new()
            .name("probe-reader".to_string())
            .spawn(move || self.run(&thread_stop))?;
        Ok(ServiceHandle { stop, thread })
    }
}

/// Lifecycle control for a spawned service
pub struct ServiceHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<EventStats>,
}

impl ServiceHandle {
    /// Ask the service to stop after its current cycle
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        if self.stop.load(Ordering::Acquire) {
            ServiceState::Stopping
        } else {
            ServiceState::Running
        }
    }

    /// Stop the service and wait for its thread
    ///
    /// # Errors
    /// Returns the panic payload if the service thread panicked
    pub fn join(self) -> std::thread::Result<EventStats> {
        self.stop();
        self.thread.join()
    }
}
