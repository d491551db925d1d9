//! # Shared Constants (Kernel Encoder ↔ Userspace Reader)
//!
//! Values both sides of the event data table must agree on. The kernel-side
//! encoder writes every event as a run of 64-bit words into a per-CPU array and
//! then publishes a 32-bit identifier through a perf event array; the reader
//! uses these constants to locate and validate what was written.
//!
//! ## Event Layout
//!
//! ```text
//! slot 0   event type word   (BASE_EVENT_TYPE | event type index)
//! slot 1   syscall number
//! slot 2   timestamp
//! slot 3   pid | tgid << 32
//! slot 4   uid | gid << 32
//! slot 5   exit code         (exit events only)
//! slot ..  parameters, in schema order
//! ```
//!
//! Strings and byte arrays always occupy `string_buffer_size / 8` slots. String
//! lists are a sequence of such buffers closed by [`VARARGS_TERMINATOR`] or
//! [`VARARGS_TRUNCATION`].

#![no_std]

// ============================================================================
// Event Header
// ============================================================================

/// Magic stored in the high 48 bits of every event type word
///
/// A type word whose masked value differs from this marks a slot that was
/// overwritten or never written.
pub const BASE_EVENT_TYPE: u64 = 0x1122_3344_5566_0000;

/// Mask selecting the magic bits of the event type word
pub const EVENT_TYPE_MAGIC_MASK: u64 = 0xFFFF_FFFF_FFFF_0000;

/// Mask selecting the event type index (low 16 bits)
pub const EVENT_TYPE_INDEX_MASK: u64 = 0xFFFF;

// ============================================================================
// String List Sentinels
// ============================================================================

/// Closes a string list that was captured completely
pub const VARARGS_TERMINATOR: u64 = 0xFFFF_0000_FFFF_0000;

/// Closes a string list the encoder had to cut short
pub const VARARGS_TRUNCATION: u64 = 0x0011_0011_0011_0011;

// ============================================================================
// Event Data Table
// ============================================================================

/// Default number of rows in the per-CPU event data table
pub const EVENT_MAP_SIZE: u32 = 100_000;

/// Size in bytes of one table slot
pub const SLOT_SIZE: usize = 8;

/// Largest string or byte array field, in bytes
pub const MAX_STRING_BUFFER_SIZE: usize = 64 * 1024;

/// Largest number of strings a string list may carry
pub const MAX_STRING_LIST_SIZE: usize = 1024;

// ============================================================================
// Event Identifier
// ============================================================================

/// Bits of the identifier holding the starting row of the event
pub const EVENT_ID_INDEX_MASK: u32 = 0x00FF_FFFF;

/// Shift applied to the identifier to reach the CPU column
pub const EVENT_ID_CPU_SHIFT: u32 = 28;

/// Mask applied after [`EVENT_ID_CPU_SHIFT`]
pub const EVENT_ID_CPU_MASK: u32 = 0xFF;

/// Build the event type word the encoder writes for `index`
#[must_use]
pub const fn event_type_word(index: u16) -> u64 {
    BASE_EVENT_TYPE | index as u64
}

/// Build an event identifier from a starting row and CPU column
///
/// Only the low 24 bits of `index` and the low 4 bits of `cpu` survive.
#[must_use]
pub const fn event_identifier(index: u32, cpu: u32) -> u32 {
    (index & EVENT_ID_INDEX_MASK) | ((cpu & EVENT_ID_CPU_MASK) << EVENT_ID_CPU_SHIFT)
}
