//! Structured error types for probe-reader
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::{CpuId, EventTypeIndex, RingIndex};
use thiserror::Error;

/// A single slot could not be read from the event data table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("Read of row {index} has failed: {message}")]
    Backend { index: RingIndex, message: String },

    #[error("Invalid CPU index: {cpu} (row has {columns} columns)")]
    InvalidCpu { cpu: CpuId, columns: usize },
}

/// Why an event was discarded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("Broken event type: {word:#x}")]
    BrokenEventType { word: u64 },

    #[error("Invalid event type: {index} (schema has {count} events)")]
    InvalidEventType { index: EventTypeIndex, count: usize },

    #[error("Invalid parameter {parameter} in event {index}")]
    UnknownParameterType { index: EventTypeIndex, parameter: String },
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid schema {probe}: {reason}")]
    Invalid { probe: String, reason: String },
}

/// The backend could not deliver event identifiers
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Event identifier stream disconnected")]
    Disconnected,
}
