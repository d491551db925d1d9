//! Staging Queue
//!
//! Hands decoded batches from the service thread to the host's poll cycle. The
//! producer never waits; the consumer waits at most [`DRAIN_TIMEOUT`] and then
//! takes everything staged so far.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::event::ProbeEvent;

/// Longest time [`StagingQueue::drain_events`] blocks on a quiet probe
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Batch hand-off between the decoder and the host
///
/// Every pushed event is returned by exactly one drain, also when several
/// threads drain concurrently.
#[derive(Clone)]
pub struct StagingQueue {
    tx: Sender<Vec<ProbeEvent>>,
    rx: Receiver<Vec<ProbeEvent>>,
}

impl StagingQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Stage a decoded batch and wake one waiting consumer
    ///
    /// Empty batches are dropped so they do not wake anybody.
    pub fn push_batch(&self, batch: Vec<ProbeEvent>) {
        if batch.is_empty() {
            return;
        }
        // Never disconnected: `self` holds a receiver
        let _ = self.tx.send(batch);
    }

    /// Wait up to [`DRAIN_TIMEOUT`] for events, then take all staged events
    #[must_use]
    pub fn drain_events(&self) -> Vec<ProbeEvent> {
        self.drain_events_timeout(DRAIN_TIMEOUT)
    }

    /// Same as [`StagingQueue::drain_events`] with an explicit wait ceiling
    #[must_use]
    pub fn drain_events_timeout(&self, timeout: Duration) -> Vec<ProbeEvent> {
        let mut events = match self.rx.recv_timeout(timeout) {
            Ok(batch) => batch,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return Vec::new(),
        };

        for batch in self.rx.try_iter() {
            events.extend(batch);
        }
        events
    }

    /// Number of batches waiting to be drained
    #[must_use]
    pub fn pending_batches(&self) -> usize {
        self.rx.len()
    }
}

impl Default for StagingQueue {
    fn default() -> Self {
        Self::new()
    }
}
