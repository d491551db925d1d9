//! Probe schema: which event type index carries which parameters
//!
//! The kernel-side encoder and this reader share no framing, so the schema is
//! the only description of an event's layout. Parameters must be listed in the
//! exact order the encoder writes them.
//!
//! Schemas are loaded from JSON:
//!
//! ```json
//! {
//!   "name": "execve",
//!   "kind": "tracepoint",
//!   "string_buffer_size": 160,
//!   "string_list_size": 10,
//!   "events": [
//!     {
//!       "name": "sys_enter_execve",
//!       "entry": true,
//!       "attach": { "program": "on_execve", "category": "syscalls" },
//!       "parameters": [
//!         { "name": "filename", "type": "string" },
//!         { "name": "argv", "type": "string_list" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use probe_reader_common::{MAX_STRING_BUFFER_SIZE, MAX_STRING_LIST_SIZE};
use serde::Deserialize;

use crate::domain::{EventTypeIndex, SchemaError};

/// Upper bound on descriptors: the type index is 16 bits wide
pub const MAX_EVENT_TYPES: usize = 1 << 16;

/// How the probe's programs are attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Tracepoint,
    Kprobe,
}

/// Declared type of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    SignedInteger,
    UnsignedInteger,
    String,
    ByteArray,
    StringList,
    /// Any tag this reader does not know how to decode
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
}

/// Where the program emitting an event hooks into the kernel
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttachPoint {
    /// Program name inside the eBPF object
    pub program: String,
    /// Tracepoint category (`syscalls`, `sched`, ...); tracepoint probes only
    #[serde(default)]
    pub category: Option<String>,
    /// Tracepoint or kernel function name; defaults to the event name
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventDescriptor {
    pub name: String,
    /// Entry events have no exit code slot
    pub entry: bool,
    #[serde(default)]
    pub attach: Option<AttachPoint>,
    #[serde(default)]
    pub parameters: Vec<ProbeParameter>,
}

impl EventDescriptor {
    /// Kernel hook name for this event
    #[must_use]
    pub fn attach_target(&self) -> Option<&str> {
        self.attach.as_ref().map(|a| a.target.as_deref().unwrap_or(&self.name))
    }
}

/// Complete description of one probe's event data layout
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeSchema {
    pub name: String,
    pub kind: ProbeKind,
    /// Encoded size in bytes of every string and byte array field
    pub string_buffer_size: usize,
    /// Maximum number of strings in a string list
    pub string_list_size: usize,
    pub events: Vec<EventDescriptor>,
}

impl ProbeSchema {
    /// Load and validate a schema from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// describes an impossible layout
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a schema from a JSON string
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the layout is invalid
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: ProbeSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Check the sizing rules the decoder relies on
    ///
    /// # Errors
    /// Returns [`SchemaError::Invalid`] describing the first violated rule
    pub fn validate(&self) -> Result<(), SchemaError> {
        let invalid = |reason: String| SchemaError::Invalid { probe: self.name.clone(), reason };

        if self.string_buffer_size == 0 || self.string_buffer_size % 8 != 0 {
            return Err(invalid(format!(
                "string_buffer_size must be a positive multiple of 8, got {}",
                self.string_buffer_size
            )));
        }
        if self.string_buffer_size > MAX_STRING_BUFFER_SIZE {
            return Err(invalid(format!(
                "string_buffer_size {} exceeds the {MAX_STRING_BUFFER_SIZE} byte limit",
                self.string_buffer_size
            )));
        }
        if self.string_list_size == 0 || self.string_list_size > MAX_STRING_LIST_SIZE {
            return Err(invalid(format!(
                "string_list_size must be between 1 and {MAX_STRING_LIST_SIZE}, got {}",
                self.string_list_size
            )));
        }
        if self.events.is_empty() {
            return Err(invalid("no events declared".to_string()));
        }
        if self.events.len() > MAX_EVENT_TYPES {
            return Err(invalid(format!(
                "{} events declared, at most {MAX_EVENT_TYPES} are addressable",
                self.events.len()
            )));
        }
        Ok(())
    }

    /// Descriptor for an event type index, if it exists
    #[must_use]
    pub fn event(&self, index: EventTypeIndex) -> Option<&EventDescriptor> {
        self.events.get(usize::from(index.0))
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}
