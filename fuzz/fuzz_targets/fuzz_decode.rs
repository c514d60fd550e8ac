#![no_main]

use libfuzzer_sys::fuzz_target;
use tagpack::{ColumnState, Segment};

// Decoding arbitrary bytes may fail, but must never panic or run away.
fuzz_target!(|data: &[u8]| {
    let mut region = data[..data.len().min(65_535)].to_vec();
    let Ok(segment) = Segment::new(&mut region) else {
        return;
    };

    let mut states = vec![ColumnState::default(); segment.number_of_values()];
    let mut cursor = segment.entries();
    loop {
        match cursor.next_entry(&mut states) {
            Ok(Some(entry)) => {
                let _ = entry.timestamp;
                let _ = entry.tag.len();
            }
            Ok(None) | Err(_) => break,
        }
    }
});
