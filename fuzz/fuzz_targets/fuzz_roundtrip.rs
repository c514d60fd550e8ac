#![no_main]

use libfuzzer_sys::fuzz_target;
use tagpack::{ColumnState, Segment};

const TAG_POOL: [&[u8]; 4] = [b"hello", b"world", b"sensors/9", b""];

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the column count; the rest is consumed as
    // (offset_delta: u16, tag_selector: u8, column bits: u64 each) tuples.
    let columns = usize::from(data[0] % 4) + 1;
    let mut region = vec![0u8; 4096];
    let mut segment = Segment::initialize(&mut region, columns).unwrap();

    let mut offset = 0u32;
    let mut expected: Vec<(u32, Vec<f64>, &[u8])> = Vec::new();
    let entry_bytes = 3 + columns * 8;
    for chunk in data[1..].chunks(entry_bytes) {
        if chunk.len() < entry_bytes {
            break;
        }
        offset = offset.saturating_add(u32::from(u16::from_le_bytes([chunk[0], chunk[1]])));
        if offset >= 1 << 31 {
            break;
        }
        let values: Vec<f64> = chunk[3..]
            .chunks(8)
            .map(|raw| f64::from_bits(u64::from_le_bytes(raw.try_into().unwrap())))
            .collect();
        let tag = TAG_POOL[usize::from(chunk[2]) % TAG_POOL.len()];
        if !segment.append(offset, &values, tag).unwrap() {
            break;
        }
        expected.push((offset, values, tag));
    }

    // Property 1: decode reproduces every appended tuple bit for bit.
    let mut states = vec![ColumnState::default(); columns];
    let mut cursor = segment.entries();
    let mut decoded = 0usize;
    while let Some(entry) = cursor.next_entry(&mut states).unwrap() {
        let (offset, values, tag) = &expected[decoded];
        assert_eq!(entry.timestamp, *offset, "timestamp mismatch");
        for (state, value) in states.iter().zip(values.iter()) {
            assert_eq!(state.value().to_bits(), value.to_bits(), "value mismatch");
        }
        assert_eq!(entry.tag, *tag, "tag mismatch");
        decoded += 1;
    }

    // Property 2: the decoded count matches both the input and the header.
    assert_eq!(decoded, expected.len(), "entry count mismatch");
    assert_eq!(decoded, segment.number_of_entries(), "header count mismatch");
});
