mod common;

use common::{identifier, open_schema, table, write_events, EventWords};
use probe_reader::backend::MemoryTable;
use probe_reader::domain::{RawEventId, RingLayout};
use probe_reader::event::{FieldValue, ProbeEvent, StringList};
use probe_reader::reader::EventAssembler;

const MAX_LEN: usize = 16;

fn decode(assembler: &mut EventAssembler, table: &MemoryTable, ids: &[u32]) -> Vec<ProbeEvent> {
    let ids: Vec<RawEventId> = ids.iter().copied().map(RawEventId).collect();
    assembler.process_batch(table, &ids)
}

fn assembler(capacity: u32) -> EventAssembler {
    EventAssembler::new(open_schema(), RingLayout::new(capacity))
}

fn entry(timestamp: u64) -> EventWords {
    EventWords::new(0, timestamp, MAX_LEN)
        .string("/etc/passwd")
        .signed(-100)
        .string("cat")
        .string("-n")
        .terminator()
}

#[test]
fn test_header_halves_are_split() {
    let mut table = table(64, 1);
    let event = entry(42).syscall(257).task(1234, 1200).creds(1000, 100);
    let ids = write_events(&mut table, 0, 0, &[event]);

    let events = decode(&mut assembler(64), &table, &ids);
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event.syscall_number, 257);
    assert_eq!(event.timestamp, 42);
    assert_eq!((event.pid, event.tgid), (1234, 1200));
    assert_eq!((event.uid, event.gid), (1000, 100));
    assert!(event.is_entry());
}

#[test]
fn test_string_field_stops_at_null_and_skips_full_buffer() {
    let mut table = table(64, 1);
    let ids = write_events(&mut table, 0, 0, &[entry(1)]);

    let events = decode(&mut assembler(64), &table, &ids);
    let event = &events[0];

    assert_eq!(event.field("filename").and_then(FieldValue::as_str), Some("/etc/passwd"));
    // The next field starts after the whole 16-byte buffer
    assert_eq!(event.field("flags").and_then(FieldValue::as_signed), Some(-100));
}

#[test]
fn test_string_filling_whole_buffer() {
    let mut table = table(64, 1);
    let event = EventWords::new(0, 1, MAX_LEN)
        .string("0123456789abcdef")
        .signed(7)
        .terminator();
    let ids = write_events(&mut table, 0, 0, &[event]);

    let events = decode(&mut assembler(64), &table, &ids);
    assert_eq!(events[0].field("filename").and_then(FieldValue::as_str), Some("0123456789abcdef"));
    assert_eq!(events[0].field("flags").and_then(FieldValue::as_signed), Some(7));
}

#[test]
fn test_exit_event_byte_array_has_full_length() {
    let mut table = table(64, 1);
    let event = EventWords::new(1, 9, MAX_LEN).exit_code(-2).buffer(b"ab\0cd").unsigned(0o644);
    let ids = write_events(&mut table, 0, 0, &[event]);

    let events = decode(&mut assembler(64), &table, &ids);
    let event = &events[0];

    assert_eq!(event.exit_code, Some(-2));
    let Some(FieldValue::ByteArray(content)) = event.field("content") else {
        panic!("content should be a byte array");
    };
    assert_eq!(content.len(), MAX_LEN);
    assert_eq!(&content[..5], b"ab\0cd");
    assert_eq!(event.field("mode").and_then(FieldValue::as_unsigned), Some(0o644));
}

#[test]
fn test_string_list_sentinels() {
    let mut table = table(256, 1);
    let complete = entry(1);
    let truncated = EventWords::new(0, 2, MAX_LEN)
        .string("/bin/ls")
        .signed(0)
        .string("ls")
        .truncation();
    let full = EventWords::new(0, 3, MAX_LEN)
        .string("/bin/echo")
        .signed(0)
        .string("echo")
        .string("a")
        .string("b");
    let ids = write_events(&mut table, 0, 0, &[complete, truncated, full]);

    let events = decode(&mut assembler(256), &table, &ids);
    assert_eq!(events.len(), 3);

    let argv = |event: &ProbeEvent| match event.field("argv") {
        Some(FieldValue::StringList(list)) => list.clone(),
        other => panic!("argv should be a string list, got {other:?}"),
    };

    assert_eq!(
        argv(&events[0]),
        StringList { data: vec!["cat".to_string(), "-n".to_string()], truncated: false }
    );
    assert_eq!(argv(&events[1]), StringList { data: vec!["ls".to_string()], truncated: true });
    assert_eq!(argv(&events[2]).data, vec!["echo", "a", "b"]);
    assert!(argv(&events[2]).truncated);
}

#[test]
fn test_empty_string_list() {
    let mut table = table(64, 1);
    let event = EventWords::new(0, 1, MAX_LEN).string("x").signed(0).terminator();
    let ids = write_events(&mut table, 0, 0, &[event]);

    let events = decode(&mut assembler(64), &table, &ids);
    assert_eq!(events[0].field("argv"), Some(&FieldValue::StringList(StringList::default())));
}

#[test]
fn test_broken_magic_does_not_stop_batch() {
    let mut table = table(128, 1);
    let broken = EventWords::with_type_word(0xdead_beef_0000_0000, 2, MAX_LEN);
    let ids = write_events(&mut table, 0, 0, &[entry(1), broken, entry(3)]);

    let mut assembler = assembler(128);
    let events = decode(&mut assembler, &table, &ids);

    let timestamps: Vec<u64> = events.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![1, 3]);
    assert_eq!(assembler.stats.broken_event_type, 1);
    assert_eq!(assembler.stats.processed, 3);
    assert_eq!(assembler.stats.discarded(), 1);
}

#[test]
fn test_unknown_event_type_is_discarded() {
    let mut table = table(64, 1);
    let ids = write_events(&mut table, 0, 0, &[EventWords::new(5, 1, MAX_LEN)]);

    let mut assembler = assembler(64);
    assert!(decode(&mut assembler, &table, &ids).is_empty());
    assert_eq!(assembler.stats.invalid_event_type, 1);
}

#[test]
fn test_decoding_is_idempotent() {
    let mut table = table(64, 2);
    let exit = EventWords::new(1, 6, MAX_LEN).exit_code(0).buffer(b"data").unsigned(1);
    let ids = write_events(&mut table, 1, 10, &[entry(5), exit]);

    let mut assembler = assembler(64);
    let first = decode(&mut assembler, &table, &ids);
    let second = decode(&mut assembler, &table, &ids);
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_event_wraps_around_ring_end() {
    let capacity = 16;
    let mut table = table(capacity, 1);
    // Starts three rows before the end; the buffers spill into rows 0..
    let ids = write_events(&mut table, 0, capacity - 3, &[entry(77)]);
    assert_eq!(ids, vec![identifier(capacity - 3, 0)]);

    let events = decode(&mut assembler(capacity), &table, &ids);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].timestamp, 77);
    assert_eq!(events[0].field("filename").and_then(FieldValue::as_str), Some("/etc/passwd"));
}

#[test]
fn test_events_on_different_cpus() {
    let mut table = table(64, 4);
    let mut ids = write_events(&mut table, 0, 0, &[entry(1)]);
    ids.extend(write_events(&mut table, 3, 0, &[entry(2).task(99, 98)]));

    let events = decode(&mut assembler(64), &table, &ids);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].pid, 99);
    assert_eq!(events[1].timestamp, 2);
}

#[test]
fn test_invalid_cpu_and_failed_row_discard_only_that_event() {
    let mut table = table(64, 2);
    let mut ids = write_events(&mut table, 0, 0, &[entry(1)]);
    let failing = write_events(&mut table, 1, 30, &[entry(2)]);
    table.fail_row(31);
    ids.extend(failing);
    ids.push(identifier(0, 7));
    ids.extend(write_events(&mut table, 1, 0, &[entry(3)]));

    let mut assembler = assembler(64);
    let events = decode(&mut assembler, &table, &ids);

    let timestamps: Vec<u64> = events.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![1, 3]);
    assert_eq!(assembler.stats.read_failures, 2);
}

#[test]
fn test_json_output_shape() {
    let mut table = table(64, 1);
    let ids = write_events(&mut table, 0, 0, &[entry(11).task(5, 6)]);
    let events = decode(&mut assembler(64), &table, &ids);

    let value = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(value["event_type"], 0);
    assert_eq!(value["pid"], 5);
    assert_eq!(value["exit_code"], serde_json::Value::Null);
    assert_eq!(value["fields"]["filename"], "/etc/passwd");
    assert_eq!(value["fields"]["argv"]["data"][1], "-n");
    assert_eq!(value["fields"]["argv"]["truncated"], false);
}
