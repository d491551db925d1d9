//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep the many integers flowing through the decoder
//! apart: a ring row is not a CPU column, and neither is an event type index.

use std::fmt;

use probe_reader_common::{
    EVENT_ID_CPU_MASK, EVENT_ID_CPU_SHIFT, EVENT_ID_INDEX_MASK, EVENT_MAP_SIZE,
};

/// CPU column in the per-CPU event data table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpuId(pub u32);

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU:{}", self.0)
    }
}

/// Row in the event data table (always below the ring capacity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RingIndex(pub u32);

impl fmt::Display for RingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index into the schema's event descriptor list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct EventTypeIndex(pub u16);

impl fmt::Display for EventTypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque 32-bit token published by the kernel for every finished event
///
/// Bits 0-23 hold the starting row, bits 28 and up hold the CPU column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawEventId(pub u32);

impl RawEventId {
    /// Starting row of the event, wrapped into a ring of `layout.capacity` rows
    #[must_use]
    pub fn ring_index(self, layout: RingLayout) -> RingIndex {
        RingIndex((self.0 & EVENT_ID_INDEX_MASK) % layout.capacity)
    }

    /// CPU column the event was written to
    #[must_use]
    pub fn cpu(self) -> CpuId {
        CpuId((self.0 >> EVENT_ID_CPU_SHIFT) & EVENT_ID_CPU_MASK)
    }
}

impl fmt::Display for RawEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Geometry of the event data table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingLayout {
    /// Number of rows; every index is taken modulo this value
    pub capacity: u32,
}

impl RingLayout {
    /// Create a layout with `capacity` rows (panics if zero)
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "Ring capacity must be non-zero");
        Self { capacity }
    }

    /// Index `count` rows after `index`, wrapping at the capacity
    #[must_use]
    pub fn advance(self, index: RingIndex, count: u32) -> RingIndex {
        let next = (u64::from(index.0) + u64::from(count)) % u64::from(self.capacity);
        // Result is below `capacity`, which is a u32
        #[allow(clippy::cast_possible_truncation)]
        RingIndex(next as u32)
    }
}

impl Default for RingLayout {
    fn default() -> Self {
        Self { capacity: EVENT_MAP_SIZE }
    }
}
