//! Shared helpers for building synthetic event data tables
#![allow(dead_code)]

use probe_reader::backend::MemoryTable;
use probe_reader::domain::RingLayout;
use probe_reader::schema::ProbeSchema;
use probe_reader_common::{event_type_word, VARARGS_TERMINATOR, VARARGS_TRUNCATION};

/// Encodes one event the way the kernel side lays it out in the table
pub struct EventWords {
    words: Vec<u64>,
    max_len: usize,
}

impl EventWords {
    /// Header with syscall 0, pid/tgid 1 and uid/gid 0
    pub fn new(event_type: u16, timestamp: u64, max_len: usize) -> Self {
        Self { words: vec![event_type_word(event_type), 0, timestamp, 1 | (1 << 32), 0], max_len }
    }

    /// Header with an arbitrary first word
    pub fn with_type_word(word: u64, timestamp: u64, max_len: usize) -> Self {
        Self { words: vec![word, 0, timestamp, 0, 0], max_len }
    }

    pub fn syscall(mut self, number: i64) -> Self {
        self.words[1] = number as u64;
        self
    }

    pub fn task(mut self, pid: u32, tgid: u32) -> Self {
        self.words[3] = u64::from(pid) | (u64::from(tgid) << 32);
        self
    }

    pub fn creds(mut self, uid: u32, gid: u32) -> Self {
        self.words[4] = u64::from(uid) | (u64::from(gid) << 32);
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.words.push(i64::from(code) as u64);
        self
    }

    pub fn unsigned(mut self, value: u64) -> Self {
        self.words.push(value);
        self
    }

    pub fn signed(mut self, value: i64) -> Self {
        self.words.push(value as u64);
        self
    }

    /// A fixed buffer, padded with zeros to the full width
    pub fn buffer(mut self, bytes: &[u8]) -> Self {
        let mut padded = bytes.to_vec();
        padded.resize(self.max_len.div_ceil(8) * 8, 0);
        self.words.extend(padded.chunks(8).map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            u64::from_le_bytes(raw)
        }));
        self
    }

    pub fn string(self, s: &str) -> Self {
        self.buffer(s.as_bytes())
    }

    pub fn terminator(self) -> Self {
        self.unsigned(VARARGS_TERMINATOR)
    }

    pub fn truncation(self) -> Self {
        self.unsigned(VARARGS_TRUNCATION)
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

/// Write consecutive events for one CPU starting at `start`
///
/// Returns the identifier of every event in order.
pub fn write_events(table: &mut MemoryTable, cpu: usize, start: u32, events: &[EventWords]) -> Vec<u32> {
    let mut index = start;
    let mut ids = Vec::with_capacity(events.len());
    for event in events {
        ids.push(identifier(index % table.layout().capacity, cpu));
        index = table.write_words(index, cpu, event.words()).0;
    }
    ids
}

pub fn identifier(index: u32, cpu: usize) -> u32 {
    probe_reader_common::event_identifier(index, u32::try_from(cpu).unwrap())
}

pub fn table(capacity: u32, cpus: usize) -> MemoryTable {
    MemoryTable::new(RingLayout::new(capacity), cpus)
}

/// Two events: `0` opens a file (entry), `1` is its exit carrying the buffer
pub const OPEN_SCHEMA: &str = r#"{
    "name": "open",
    "kind": "tracepoint",
    "string_buffer_size": 16,
    "string_list_size": 3,
    "events": [
        {
            "name": "sys_enter_openat",
            "entry": true,
            "attach": { "program": "on_enter_openat", "category": "syscalls" },
            "parameters": [
                { "name": "filename", "type": "string" },
                { "name": "flags", "type": "signed_integer" },
                { "name": "argv", "type": "string_list" }
            ]
        },
        {
            "name": "sys_exit_openat",
            "entry": false,
            "attach": { "program": "on_exit_openat", "category": "syscalls" },
            "parameters": [
                { "name": "content", "type": "byte_array" },
                { "name": "mode", "type": "unsigned_integer" }
            ]
        }
    ]
}"#;

pub fn open_schema() -> ProbeSchema {
    ProbeSchema::from_json(OPEN_SCHEMA).unwrap()
}
