mod proptests;

use crate::{ColumnState, Segment};

/// Decode every entry of `segment` into owned tuples of timestamp, value
/// bit patterns and tag bytes.
fn collect_entries(segment: &Segment<'_>) -> Vec<(u32, Vec<u64>, Vec<u8>)> {
    let mut values = vec![ColumnState::default(); segment.number_of_values()];
    let mut cursor = segment.entries();
    let mut out = Vec::new();
    while let Some(entry) = cursor.next_entry(&mut values).unwrap() {
        out.push((
            entry.timestamp,
            values.iter().map(|state| state.raw_bits).collect(),
            entry.tag.to_vec(),
        ));
    }
    out
}

/// How many times `needle` appears in `haystack`; used to prove a tag's
/// bytes were stored once and then back-referenced.
fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|window| *window == needle).count()
}
