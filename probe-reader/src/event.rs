//! Decoded probe events handed to the host
//!
//! A [`ProbeEvent`] is built once per successfully decoded identifier and is
//! never modified afterwards.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::EventTypeIndex;

/// Strings captured from a variable-length list (argv, envp, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StringList {
    pub data: Vec<String>,
    /// Set when the list did not end on the terminator sentinel
    pub truncated: bool,
}

/// Value of a single decoded parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Signed(i64),
    Unsigned(u64),
    String(String),
    ByteArray(Vec<u8>),
    StringList(StringList),
}

impl FieldValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_signed(&self) -> Option<i64> {
        match self {
            FieldValue::Signed(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v),
            _ => None,
        }
    }
}

/// One syscall entry or exit, fully decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeEvent {
    pub event_type: EventTypeIndex,
    pub syscall_number: i64,
    pub timestamp: u64,
    pub pid: u32,
    pub tgid: u32,
    pub uid: u32,
    pub gid: u32,
    /// Present on exit events only
    pub exit_code: Option<i32>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl ProbeEvent {
    /// Look up a decoded parameter by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn is_entry(&self) -> bool {
        self.exit_code.is_none()
    }
}
