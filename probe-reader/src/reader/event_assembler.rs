//! # Event Assembler
//!
//! Turns raw identifiers into [`ProbeEvent`]s.
//!
//! ## Decode Order
//!
//! 1. Split the identifier into starting row and CPU column
//! 2. Event type word: magic check, then type index bounds check
//! 3. Syscall number, timestamp, pid/tgid, uid/gid
//! 4. Exit code (exit events only)
//! 5. Parameters, in schema order
//!
//! The order mirrors what the kernel encoder writes; there is no framing to
//! recover from a mismatch. Any failure discards the whole event and the batch
//! moves on to the next identifier.

use std::collections::BTreeMap;

use log::{debug, error};
use probe_reader_common::{BASE_EVENT_TYPE, EVENT_TYPE_INDEX_MASK, EVENT_TYPE_MAGIC_MASK};

use super::decoders::{read_byte_array, read_scalar, read_string, read_string_list};
use super::slot_reader::SlotCursor;
use crate::backend::EventDataTable;
use crate::domain::{DecodeError, EventTypeIndex, RawEventId, RingLayout};
use crate::event::{FieldValue, ProbeEvent};
use crate::schema::{ParameterKind, ProbeParameter, ProbeSchema};

/// Per-outcome counters, accumulated across batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventStats {
    pub processed: u64,
    pub decoded: u64,
    /// Backend row failures and out-of-range CPU columns
    pub read_failures: u64,
    /// Event type word without the magic bits
    pub broken_event_type: u64,
    /// Type index outside the schema
    pub invalid_event_type: u64,
    pub unknown_parameter: u64,
}

impl EventStats {
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.processed - self.decoded
    }

    fn record_error(&mut self, err: &DecodeError) {
        match err {
            DecodeError::Read(_) => self.read_failures += 1,
            DecodeError::BrokenEventType { .. } => self.broken_event_type += 1,
            DecodeError::InvalidEventType { .. } => self.invalid_event_type += 1,
            DecodeError::UnknownParameterType { .. } => self.unknown_parameter += 1,
        }
    }
}

/// Decodes events of one probe schema out of the event data table
pub struct EventAssembler {
    schema: ProbeSchema,
    layout: RingLayout,
    pub stats: EventStats,
}

impl EventAssembler {
    #[must_use]
    pub fn new(schema: ProbeSchema, layout: RingLayout) -> Self {
        Self { schema, layout, stats: EventStats::default() }
    }

    /// Decode every identifier of a batch, skipping the ones that fail
    ///
    /// Failures are logged and counted in [`EventAssembler::stats`]; they never
    /// stop the batch.
    pub fn process_batch<T: EventDataTable + ?Sized>(
        &mut self,
        table: &T,
        ids: &[RawEventId],
    ) -> Vec<ProbeEvent> {
        let event_count = self.schema.event_count();
        let mut events = Vec::with_capacity(ids.len());

        for &id in ids {
            self.stats.processed += 1;

            match self.decode_with_count(table, id, event_count) {
                Ok(event) => {
                    self.stats.decoded += 1;
                    events.push(event);
                }
                Err(err) => {
                    self.stats.record_error(&err);
                    error!("{err} (event {id} from the following probe: {})", self.schema.name);
                }
            }
        }

        debug!(
            "Decoded {}/{} events from probe {}",
            events.len(),
            ids.len(),
            self.schema.name
        );
        events
    }

    /// Decode the event identified by `id`
    ///
    /// # Errors
    /// Returns the reason the event has to be discarded
    pub fn decode_event<T: EventDataTable + ?Sized>(
        &self,
        table: &T,
        id: RawEventId,
    ) -> Result<ProbeEvent, DecodeError> {
        self.decode_with_count(table, id, self.schema.event_count())
    }

    fn decode_with_count<T: EventDataTable + ?Sized>(
        &self,
        table: &T,
        id: RawEventId,
        event_count: usize,
    ) -> Result<ProbeEvent, DecodeError> {
        let mut cursor = SlotCursor::new(table, self.layout, id.ring_index(self.layout), id.cpu());

        let word: u64 = read_scalar(&mut cursor)?;
        if word & EVENT_TYPE_MAGIC_MASK != BASE_EVENT_TYPE {
            return Err(DecodeError::BrokenEventType { word });
        }

        // Masked to 16 bits
        #[allow(clippy::cast_possible_truncation)]
        let event_type = EventTypeIndex((word & EVENT_TYPE_INDEX_MASK) as u16);
        let descriptor = match self.schema.event(event_type) {
            Some(descriptor) if usize::from(event_type.0) < event_count => descriptor,
            _ => {
                return Err(DecodeError::InvalidEventType {
                    index: event_type,
                    count: event_count,
                })
            }
        };

        let syscall_number: i64 = read_scalar(&mut cursor)?;
        let timestamp: u64 = read_scalar(&mut cursor)?;
        let (pid, tgid) = split_word(read_scalar(&mut cursor)?);
        let (uid, gid) = split_word(read_scalar(&mut cursor)?);

        let exit_code =
            if descriptor.entry { None } else { Some(read_scalar::<i32, _>(&mut cursor)?) };

        let mut fields = BTreeMap::new();
        for parameter in &descriptor.parameters {
            let value = self.decode_parameter(&mut cursor, event_type, parameter)?;
            fields.entry(parameter.name.clone()).or_insert(value);
        }

        Ok(ProbeEvent {
            event_type,
            syscall_number,
            timestamp,
            pid,
            tgid,
            uid,
            gid,
            exit_code,
            fields,
        })
    }

    fn decode_parameter<T: EventDataTable + ?Sized>(
        &self,
        cursor: &mut SlotCursor<'_, T>,
        event_type: EventTypeIndex,
        parameter: &ProbeParameter,
    ) -> Result<FieldValue, DecodeError> {
        let max_len = self.schema.string_buffer_size;

        let value = match parameter.kind {
            ParameterKind::SignedInteger => FieldValue::Signed(read_scalar(cursor)?),
            ParameterKind::UnsignedInteger => FieldValue::Unsigned(read_scalar(cursor)?),
            ParameterKind::String => FieldValue::String(read_string(cursor, max_len)?),
            ParameterKind::ByteArray => FieldValue::ByteArray(read_byte_array(cursor, max_len)?),
            ParameterKind::StringList => FieldValue::StringList(read_string_list(
                cursor,
                max_len,
                self.schema.string_list_size,
            )?),
            ParameterKind::Unsupported => {
                return Err(DecodeError::UnknownParameterType {
                    index: event_type,
                    parameter: parameter.name.clone(),
                })
            }
        };

        Ok(value)
    }
}

/// Split a packed word into its low and high 32-bit halves
#[allow(clippy::cast_possible_truncation)]
fn split_word(word: u64) -> (u32, u32) {
    (word as u32, (word >> 32) as u32)
}
