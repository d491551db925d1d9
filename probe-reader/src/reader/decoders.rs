//! Scalar and buffer decoders
//!
//! Build typed values out of consecutive slots. Every slot is interpreted as a
//! little-endian `u64`, which matches the byte order the kernel encoder uses on
//! the architectures eBPF runs on.
//!
//! Strings and byte arrays are fixed-width: they always occupy
//! `ceil(max_len / 8)` slots, whatever their content.

use probe_reader_common::{
    MAX_STRING_BUFFER_SIZE, SLOT_SIZE, VARARGS_TERMINATOR, VARARGS_TRUNCATION,
};

use super::slot_reader::SlotCursor;
use crate::backend::EventDataTable;
use crate::domain::ReadError;
use crate::event::StringList;

/// Conversion from a raw 64-bit slot
pub trait FromSlot: Sized {
    fn from_slot(word: u64) -> Self;
}

impl FromSlot for u64 {
    fn from_slot(word: u64) -> Self {
        word
    }
}

#[allow(clippy::cast_possible_wrap)]
impl FromSlot for i64 {
    fn from_slot(word: u64) -> Self {
        word as i64
    }
}

#[allow(clippy::cast_possible_truncation)]
impl FromSlot for u32 {
    fn from_slot(word: u64) -> Self {
        word as u32
    }
}

#[allow(clippy::cast_possible_truncation)]
impl FromSlot for i32 {
    fn from_slot(word: u64) -> Self {
        word as i32
    }
}

/// Read one slot as `V`
///
/// # Errors
/// Fails if the slot cannot be read
pub fn read_scalar<V: FromSlot, T: EventDataTable + ?Sized>(
    cursor: &mut SlotCursor<'_, T>,
) -> Result<V, ReadError> {
    cursor.read_slot().map(V::from_slot)
}

/// Number of slots a fixed buffer of `max_len` bytes occupies
///
/// Schemas bound `max_len` by [`MAX_STRING_BUFFER_SIZE`], so the count always
/// fits; the saturation only guards direct callers.
#[must_use]
pub fn buffer_slot_count(max_len: usize) -> u32 {
    u32::try_from(max_len.div_ceil(SLOT_SIZE)).unwrap_or(u32::MAX)
}

/// Read a fixed-width buffer of `max_len` bytes
///
/// The cursor always moves past the whole buffer. With `null_terminated`, bytes
/// stop being collected at the first zero byte and the remaining slots of the
/// buffer are not read at all.
///
/// # Errors
/// Fails if any slot holding collected bytes cannot be read
pub fn read_fixed_buffer<T: EventDataTable + ?Sized>(
    cursor: &mut SlotCursor<'_, T>,
    max_len: usize,
    null_terminated: bool,
) -> Result<Vec<u8>, ReadError> {
    let slot_count = buffer_slot_count(max_len);
    let mut chunks = cursor.clone();
    let mut value = Vec::with_capacity(max_len.min(MAX_STRING_BUFFER_SIZE));

    'slots: for _ in 0..slot_count {
        let chunk = chunks.read_slot()?;
        for byte in chunk.to_le_bytes() {
            if value.len() == max_len || (null_terminated && byte == 0) {
                break 'slots;
            }
            value.push(byte);
        }
    }

    cursor.skip(slot_count);
    Ok(value)
}

/// Read a null-terminated string field
///
/// Invalid UTF-8 is replaced rather than rejected; the kernel copies whatever
/// bytes user memory held.
///
/// # Errors
/// Fails if a slot of the buffer cannot be read
pub fn read_string<T: EventDataTable + ?Sized>(
    cursor: &mut SlotCursor<'_, T>,
    max_len: usize,
) -> Result<String, ReadError> {
    let bytes = read_fixed_buffer(cursor, max_len, true)?;
    Ok(String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

/// Read a byte array field; always `max_len` bytes long
///
/// # Errors
/// Fails if a slot of the buffer cannot be read
pub fn read_byte_array<T: EventDataTable + ?Sized>(
    cursor: &mut SlotCursor<'_, T>,
    max_len: usize,
) -> Result<Vec<u8>, ReadError> {
    read_fixed_buffer(cursor, max_len, false)
}

/// Read a sentinel-terminated list of fixed-width strings
///
/// Before each string one slot is peeked: the truncation sentinel ends the list
/// as truncated, the terminator ends it as complete, and in both cases the
/// cursor moves past the sentinel. Anything else is the start of the next
/// string. A list that reaches `max_count` strings without a sentinel is
/// reported as truncated.
///
/// # Errors
/// Fails if any peeked or string slot cannot be read
pub fn read_string_list<T: EventDataTable + ?Sized>(
    cursor: &mut SlotCursor<'_, T>,
    max_len: usize,
    max_count: usize,
) -> Result<StringList, ReadError> {
    let mut list = StringList::default();

    for _ in 0..max_count {
        let mut peek = cursor.clone();
        match peek.read_slot()? {
            VARARGS_TRUNCATION => {
                list.truncated = true;
                *cursor = peek;
                return Ok(list);
            }
            VARARGS_TERMINATOR => {
                *cursor = peek;
                return Ok(list);
            }
            _ => {}
        }

        list.data.push(read_string(cursor, max_len)?);
    }

    list.truncated = true;
    Ok(list)
}
