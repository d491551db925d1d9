//! # aya Backend
//!
//! Connects the reader to a loaded eBPF object:
//!
//! - **Event data table**: `BPF_MAP_TYPE_PERCPU_ARRAY` of `u64`, one row per
//!   ring slot and one column per possible CPU
//! - **Identifiers**: `BPF_MAP_TYPE_PERF_EVENT_ARRAY`; every sample starts with
//!   the 32-bit identifier of a finished event
//!
//! Perf buffers are drained by one tokio task per online CPU. Identifiers are
//! forwarded over a channel so the service thread can block on them without a
//! runtime of its own.

use std::time::Duration;

use anyhow::{Context, Result};
use aya::maps::perf::AsyncPerfEventArray;
use aya::maps::{MapData, PerCpuArray};
use aya::Ebpf;
use bytes::BytesMut;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{error, info, warn};
use tokio::task::JoinHandle;

use super::{online_cpus, EventDataTable, ProbeBackend};
use crate::domain::{BackendError, RawEventId, ReadError, RingIndex};

/// Longest time `fetch_event_ids` blocks before returning an empty batch
pub const FETCH_WAKE_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on identifiers handed out by a single fetch
pub const MAX_FETCH_BATCH: usize = 4096;

/// Sample buffers per `read_events` call
const PERF_READ_BUFFERS: usize = 16;

/// Per-CPU perf ring size, in pages
const PERF_PAGE_COUNT: usize = 64;

/// Event data table backed by a per-CPU array map
pub struct PerCpuEventTable {
    map: PerCpuArray<MapData, u64>,
}

impl PerCpuEventTable {
    /// Take the per-CPU array named `name` out of `bpf`
    ///
    /// # Errors
    /// Returns an error if the map is missing or is not a per-CPU array of u64
    pub fn from_ebpf(bpf: &mut Ebpf, name: &str) -> Result<Self> {
        let map = bpf.take_map(name).with_context(|| format!("{name} map not found"))?;
        let map = PerCpuArray::try_from(map)
            .with_context(|| format!("{name} is not a per-CPU array of u64"))?;
        Ok(Self { map })
    }
}

impl EventDataTable for PerCpuEventTable {
    fn read_row(&self, index: RingIndex) -> Result<Vec<u64>, ReadError> {
        let values = self
            .map
            .get(&index.0, 0)
            .map_err(|e| ReadError::Backend { index, message: e.to_string() })?;
        Ok(values.iter().copied().collect())
    }
}

/// Backend reading a live eBPF object through aya
pub struct AyaBackend {
    name: String,
    table: PerCpuEventTable,
    ids: Receiver<RawEventId>,
    readers: Vec<JoinHandle<()>>,
}

impl AyaBackend {
    /// Take both maps out of `bpf` and start the perf readers
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if either map is missing or a perf buffer cannot be opened
    pub fn new(bpf: &mut Ebpf, name: &str, events_map: &str, data_map: &str) -> Result<Self> {
        let table = PerCpuEventTable::from_ebpf(bpf, data_map)?;

        let map = bpf
            .take_map(events_map)
            .with_context(|| format!("{events_map} map not found"))?;
        let mut perf_array = AsyncPerfEventArray::try_from(map)
            .with_context(|| format!("{events_map} is not a perf event array"))?;

        let (tx, rx) = unbounded();
        let cpus = online_cpus()?;
        let mut readers = Vec::with_capacity(cpus.len());

        for cpu in &cpus {
            let buf = perf_array
                .open(cpu.0, Some(PERF_PAGE_COUNT))
                .with_context(|| format!("Failed to open perf buffer on {cpu}"))?;
            readers.push(tokio::spawn(read_identifiers(buf, tx.clone())));
        }

        info!("✓ Reading {events_map} on {} CPUs", cpus.len());

        Ok(Self { name: name.to_string(), table, ids: rx, readers })
    }
}

impl ProbeBackend for AyaBackend {
    type Table = PerCpuEventTable;

    fn fetch_event_ids(&mut self) -> Result<Vec<RawEventId>, BackendError> {
        let first = match self.ids.recv_timeout(FETCH_WAKE_INTERVAL) {
            Ok(id) => id,
            Err(RecvTimeoutError::Timeout) => return Ok(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => return Err(BackendError::Disconnected),
        };

        let mut batch = Vec::with_capacity(self.ids.len().min(MAX_FETCH_BATCH) + 1);
        batch.push(first);
        batch.extend(self.ids.try_iter().take(MAX_FETCH_BATCH - 1));
        Ok(batch)
    }

    fn event_data_table(&self) -> &PerCpuEventTable {
        &self.table
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for AyaBackend {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

async fn read_identifiers(
    mut buf: aya::maps::perf::AsyncPerfEventArrayBuffer<MapData>,
    tx: Sender<RawEventId>,
) {
    let mut buffers =
        (0..PERF_READ_BUFFERS).map(|_| BytesMut::with_capacity(64)).collect::<Vec<_>>();

    loop {
        let events = match buf.read_events(&mut buffers).await {
            Ok(events) => events,
            Err(e) => {
                error!("Perf buffer read failed: {e}");
                return;
            }
        };

        if events.lost > 0 {
            warn!("Lost {} event identifiers", events.lost);
        }

        for sample in buffers.iter().take(events.read) {
            let Some(id) = decode_identifier(sample) else {
                warn!("Received incomplete event identifier ({} bytes)", sample.len());
                continue;
            };
            if tx.send(id).is_err() {
                return;
            }
        }
    }
}

/// Leading 4 bytes of a perf sample, little-endian
fn decode_identifier(sample: &[u8]) -> Option<RawEventId> {
    let bytes: [u8; 4] = sample.get(..4)?.try_into().ok()?;
    Some(RawEventId(u32::from_le_bytes(bytes)))
}
