//! In-memory event data table
//!
//! Stands in for the kernel map when replaying captured data and in tests.
//! Layout and wraparound match the kernel table exactly.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use super::{EventDataTable, ProbeBackend};
use crate::domain::{BackendError, RawEventId, ReadError, RingIndex, RingLayout};

/// `capacity` rows of `cpus` 64-bit words
#[derive(Debug, Clone)]
pub struct MemoryTable {
    layout: RingLayout,
    cpus: usize,
    words: Vec<u64>,
    failing: HashSet<u32>,
}

impl MemoryTable {
    /// Create a zeroed table
    #[must_use]
    pub fn new(layout: RingLayout, cpus: usize) -> Self {
        let rows = layout.capacity as usize;
        Self { layout, cpus, words: vec![0; rows * cpus], failing: HashSet::new() }
    }

    #[must_use]
    pub fn layout(&self) -> RingLayout {
        self.layout
    }

    #[must_use]
    pub fn cpus(&self) -> usize {
        self.cpus
    }

    /// Store `value` at row `index` (wrapped), column `cpu`
    ///
    /// Panics if `cpu` is outside the table.
    pub fn write(&mut self, index: u32, cpu: usize, value: u64) {
        assert!(cpu < self.cpus, "CPU column {cpu} out of range");
        let row = (index % self.layout.capacity) as usize;
        self.words[row * self.cpus + cpu] = value;
    }

    /// Store consecutive words starting at row `index`, wrapping at the end
    ///
    /// Returns the row following the last written word.
    pub fn write_words(&mut self, index: u32, cpu: usize, values: &[u64]) -> RingIndex {
        let mut row = RingIndex(index % self.layout.capacity);
        for &value in values {
            self.write(row.0, cpu, value);
            row = self.layout.advance(row, 1);
        }
        row
    }

    /// Make every later read of row `index` fail
    pub fn fail_row(&mut self, index: u32) {
        self.failing.insert(index % self.layout.capacity);
    }
}

impl EventDataTable for MemoryTable {
    fn read_row(&self, index: RingIndex) -> Result<Vec<u64>, ReadError> {
        let row = index.0 % self.layout.capacity;
        if self.failing.contains(&row) {
            return Err(ReadError::Backend { index, message: "injected read failure".to_string() });
        }
        let start = row as usize * self.cpus;
        Ok(self.words[start..start + self.cpus].to_vec())
    }
}

/// Backend replaying scripted identifier batches over a [`MemoryTable`]
#[derive(Debug)]
pub struct MemoryBackend {
    name: String,
    table: MemoryTable,
    batches: VecDeque<Result<Vec<RawEventId>, BackendError>>,
    idle: Duration,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(name: impl Into<String>, table: MemoryTable) -> Self {
        Self {
            name: name.into(),
            table,
            batches: VecDeque::new(),
            idle: Duration::from_millis(10),
        }
    }

    /// Queue a batch for a later `fetch_event_ids` call
    pub fn push_batch(&mut self, ids: impl IntoIterator<Item = u32>) {
        self.batches.push_back(Ok(ids.into_iter().map(RawEventId).collect()));
    }

    /// Make a later `fetch_event_ids` call fail with `error`
    pub fn push_error(&mut self, error: BackendError) {
        self.batches.push_back(Err(error));
    }

    /// Time `fetch_event_ids` sleeps once every batch was delivered
    #[must_use]
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    #[must_use]
    pub fn pending_batches(&self) -> usize {
        self.batches.len()
    }
}

impl ProbeBackend for MemoryBackend {
    type Table = MemoryTable;

    fn fetch_event_ids(&mut self) -> Result<Vec<RawEventId>, BackendError> {
        if let Some(batch) = self.batches.pop_front() {
            return batch;
        }
        std::thread::sleep(self.idle);
        Ok(Vec::new())
    }

    fn event_data_table(&self) -> &MemoryTable {
        &self.table
    }

    fn name(&self) -> &str {
        &self.name
    }
}
