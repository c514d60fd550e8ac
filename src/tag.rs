//! Tag dictionary: per-entry codes that avoid repeating identical tags.
//!
//! Tags are length-prefixed byte strings stored inline in the payload. Every
//! stored record carries a backward pointer to the record written before it,
//! forming a newest-first chain. An entry's tag code is one of:
//!
//! - `0` — same tag as the previous entry.
//! - `1 1 pos:16` — by-reference to the record at absolute bit position
//!   `pos`.
//! - `1 0 self:16` — a new record follows inline. `self` points just past
//!   this field, where the record begins:
//!   `[back_ptr:16][pad to byte boundary][len:8][len tag bytes]`.
//!
//! The chain walk is capped at a fixed depth, so a tag repeating further back
//! is stored again: bounded append cost traded against space.

use crate::bits::{BitsBuffer, BitsSlice};
use crate::constants::{TAG_LENGTH_BITS, TAG_POSITION_BITS, TAG_SEARCH_DEPTH};
use crate::error::DecodeError;

/// Worst-case bits one tag code can cost before the tag bytes themselves:
/// control and marker bits, self pointer, back pointer, alignment padding
/// and the length prefix.
pub(crate) const MAX_TAG_CODE_BITS: usize = 2 + 16 + 16 + 7 + 8;

/// Pad bits needed to advance `bits` to the next byte boundary.
#[inline]
pub(crate) fn byte_alignment(bits: usize) -> usize {
    (8 - bits % 8) % 8
}

/// A tag record resolved inside the payload.
pub(crate) struct TagRecord {
    /// Position of the record stored before this one (0 = chain end).
    pub back_ptr: usize,
    /// Byte offset of the tag bytes in the stream.
    pub start: usize,
    pub len: usize,
    /// Bit position just past the tag bytes.
    pub end_position: usize,
}

/// Read the record starting at absolute bit position `position`.
pub(crate) fn read_record(bits: &BitsSlice<'_>, position: usize) -> Result<TagRecord, DecodeError> {
    let mut cursor = position;
    let back_ptr = bits.read(&mut cursor, TAG_POSITION_BITS)? as usize;
    cursor += byte_alignment(cursor);
    let len = bits.read(&mut cursor, TAG_LENGTH_BITS)? as usize;
    let start = cursor / 8;
    let end_position = cursor + len * 8;
    if end_position > bits.position() {
        return Err(DecodeError::Malformed { position });
    }
    Ok(TagRecord {
        back_ptr,
        start,
        len,
        end_position,
    })
}

/// The tag bytes a record points at.
pub(crate) fn record_bytes<'a>(bits: &BitsSlice<'a>, record: &TagRecord) -> &'a [u8] {
    &bits.stream()[record.start..record.start + record.len]
}

/// Header fields produced by planning one tag write.
pub(crate) struct TagHeaderUpdate {
    /// Head of the backward chain (most recently written record).
    pub previous_tag_position: u16,
    /// Record used by the entry being appended.
    pub last_tag_position: u16,
}

/// Encode one tag code into `scratch`.
///
/// `live` is the committed payload, searched for reusable records. `bias`
/// maps scratch positions to their final position once the scratch content
/// is transplanted behind the live write position; all stored pointers and
/// the byte alignment padding are computed against those final positions.
pub(crate) fn encode(
    live: &BitsSlice<'_>,
    scratch: &mut BitsBuffer<'_>,
    bias: usize,
    previous_tag_position: u16,
    last_tag_position: u16,
    tag: &[u8],
) -> TagHeaderUpdate {
    // Same tag as the previous entry: a single bit, no positions. The check
    // runs against the record that entry actually used, which after a
    // by-reference hit is not the chain head.
    if last_tag_position != 0 {
        if let Ok(record) = read_record(live, usize::from(last_tag_position)) {
            if record_bytes(live, &record) == tag {
                scratch.append(0, 1);
                return TagHeaderUpdate {
                    previous_tag_position,
                    last_tag_position,
                };
            }
        }
    }

    // Walk the backward chain, newest first, a bounded number of records. An
    // unreadable record ends the walk and the tag is stored fresh.
    let mut position = usize::from(previous_tag_position);
    for _ in 0..TAG_SEARCH_DEPTH {
        if position == 0 {
            break;
        }
        let Ok(record) = read_record(live, position) else {
            break;
        };
        if record_bytes(live, &record) == tag {
            scratch.append(1, 1);
            scratch.append(1, 1);
            scratch.append(position as u64, TAG_POSITION_BITS);
            return TagHeaderUpdate {
                previous_tag_position,
                last_tag_position: position as u16,
            };
        }
        position = record.back_ptr;
    }

    // Store the tag again: marker, self pointer, then the record itself.
    scratch.append(1, 1);
    scratch.append(0, 1);
    let record_position = bias + scratch.position() + usize::from(TAG_POSITION_BITS);
    scratch.append(record_position as u64, TAG_POSITION_BITS);
    scratch.append(u64::from(previous_tag_position), TAG_POSITION_BITS);
    let pad = byte_alignment(bias + scratch.position());
    scratch.append(0, pad as u8);
    scratch.append(tag.len() as u64, TAG_LENGTH_BITS);
    for &byte in tag {
        scratch.append(u64::from(byte), 8);
    }
    TagHeaderUpdate {
        previous_tag_position: record_position as u16,
        last_tag_position: record_position as u16,
    }
}

/// Tag span held by a decode cursor: a byte range in the stream.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TagSpan {
    pub start: usize,
    pub len: usize,
}

/// Decode one tag code, updating the cursor's current span.
pub(crate) fn decode(
    bits: &BitsSlice<'_>,
    cursor: &mut usize,
    current: &mut TagSpan,
) -> Result<(), DecodeError> {
    if bits.read(cursor, 1)? == 0 {
        // Same tag as the previous entry.
        return Ok(());
    }
    if bits.read(cursor, 1)? == 1 {
        let position = bits.read(cursor, TAG_POSITION_BITS)? as usize;
        let record = read_record(bits, position)?;
        *current = TagSpan {
            start: record.start,
            len: record.len,
        };
        return Ok(());
    }
    let self_ptr = bits.read(cursor, TAG_POSITION_BITS)? as usize;
    if self_ptr != *cursor {
        return Err(DecodeError::Malformed { position: *cursor });
    }
    let record = read_record(bits, self_ptr)?;
    *current = TagSpan {
        start: record.start,
        len: record.len,
    };
    *cursor = record.end_position;
    Ok(())
}
