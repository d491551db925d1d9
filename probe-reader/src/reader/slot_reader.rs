//! Slot Reader
//!
//! The only code that touches the event data table. A [`SlotCursor`] walks one
//! CPU column of the table, one 64-bit slot at a time, wrapping at the ring
//! capacity.

use crate::backend::EventDataTable;
use crate::domain::{CpuId, ReadError, RingIndex, RingLayout};

/// Read position inside one CPU column of the event data table
///
/// Cloning a cursor gives an independent look-ahead position over the same
/// table.
pub struct SlotCursor<'a, T: EventDataTable + ?Sized> {
    table: &'a T,
    layout: RingLayout,
    index: RingIndex,
    cpu: CpuId,
}

impl<T: EventDataTable + ?Sized> Clone for SlotCursor<'_, T> {
    fn clone(&self) -> Self {
        Self { table: self.table, layout: self.layout, index: self.index, cpu: self.cpu }
    }
}

impl<'a, T: EventDataTable + ?Sized> SlotCursor<'a, T> {
    #[must_use]
    pub fn new(table: &'a T, layout: RingLayout, index: RingIndex, cpu: CpuId) -> Self {
        let index = RingIndex(index.0 % layout.capacity);
        Self { table, layout, index, cpu }
    }

    /// Read the slot under the cursor and step past it
    ///
    /// The cursor only moves when the read succeeds.
    ///
    /// # Errors
    /// Returns an error if the backend fails to read the row or the row has
    /// no column for this cursor's CPU
    pub fn read_slot(&mut self) -> Result<u64, ReadError> {
        let row = self.table.read_row(self.index)?;
        let cpu = self.cpu.0 as usize;
        let Some(&word) = row.get(cpu) else {
            return Err(ReadError::InvalidCpu { cpu: self.cpu, columns: row.len() });
        };
        self.index = self.layout.advance(self.index, 1);
        Ok(word)
    }

    /// Step past `count` slots without reading them
    pub fn skip(&mut self, count: u32) {
        self.index = self.layout.advance(self.index, count);
    }

    #[must_use]
    pub fn position(&self) -> RingIndex {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryTable;

    fn table() -> MemoryTable {
        let mut table = MemoryTable::new(RingLayout::new(4), 2);
        table.write_words(0, 0, &[10, 11, 12, 13]);
        table.write_words(0, 1, &[20, 21, 22, 23]);
        table
    }

    #[test]
    fn test_reads_own_column() {
        let table = table();
        let mut cursor = SlotCursor::new(&table, table.layout(), RingIndex(1), CpuId(1));
        assert_eq!(cursor.read_slot().unwrap(), 21);
        assert_eq!(cursor.read_slot().unwrap(), 22);
        assert_eq!(cursor.position(), RingIndex(3));
    }

    #[test]
    fn test_wraps_at_capacity() {
        let table = table();
        let mut cursor = SlotCursor::new(&table, table.layout(), RingIndex(3), CpuId(0));
        assert_eq!(cursor.read_slot().unwrap(), 13);
        assert_eq!(cursor.read_slot().unwrap(), 10);
        assert_eq!(cursor.position(), RingIndex(1));
    }

    #[test]
    fn test_start_index_is_wrapped() {
        let table = table();
        let cursor = SlotCursor::new(&table, table.layout(), RingIndex(6), CpuId(0));
        assert_eq!(cursor.position(), RingIndex(2));
    }

    #[test]
    fn test_invalid_cpu() {
        let table = table();
        let mut cursor = SlotCursor::new(&table, table.layout(), RingIndex(0), CpuId(2));
        let err = cursor.read_slot().unwrap_err();
        assert_eq!(err, ReadError::InvalidCpu { cpu: CpuId(2), columns: 2 });
        assert_eq!(cursor.position(), RingIndex(0));
    }

    #[test]
    fn test_backend_failure_does_not_advance() {
        let mut table = table();
        table.fail_row(2);
        let mut cursor = SlotCursor::new(&table, table.layout(), RingIndex(1), CpuId(0));
        assert_eq!(cursor.read_slot().unwrap(), 11);
        assert!(matches!(cursor.read_slot(), Err(ReadError::Backend { .. })));
        assert_eq!(cursor.position(), RingIndex(2));
    }

    #[test]
    fn test_skip_and_clone() {
        let table = table();
        let mut cursor = SlotCursor::new(&table, table.layout(), RingIndex(0), CpuId(0));
        let mut peek = cursor.clone();
        cursor.skip(5);
        assert_eq!(cursor.position(), RingIndex(1));
        assert_eq!(peek.read_slot().unwrap(), 10);
        assert_eq!(cursor.read_slot().unwrap(), 11);
    }
}
