//! Delta-of-delta timestamp codec.
//!
//! The first entry of a segment stores its raw 31-bit offset. Every later
//! entry stores how much the sampling interval changed: a steady interval is
//! a single `0` bit, anything else selects a bucket from
//! [`TIMESTAMP_ENCODINGS`] with a unary control prefix and stores the change
//! biased into the bucket's fixed width.

use crate::bits::{BitsBuffer, BitsSlice};
use crate::constants::{DEFAULT_DELTA, FIRST_TIMESTAMP_BITS};
use crate::error::DecodeError;

/// One row of the control-prefix table: changes with `|v| < max_value` are
/// biased by `max_value` and stored in `value_bits` bits after the prefix.
pub(crate) struct TimestampEncoding {
    pub control_value: u64,
    pub control_bits: u8,
    pub value_bits: u8,
    pub max_value: i64,
}

/// Version tag of the bucket table. Segments do not record the table that
/// wrote them, so any change to the table shape must bump this and is a
/// breaking format revision.
#[allow(dead_code)]
pub(crate) const TIMESTAMP_TABLE_VERSION: u8 = 1;

/// Bucket table, ascending. The control prefix for row `i` is `i + 1` one
/// bits; every row but the last ends with a zero terminator, the last is
/// ended by the scan limit. The last row spans the full delta-of-delta range
/// reachable from 31-bit offsets, so it doubles as the overflow bucket and
/// encoding cannot run off the table.
pub(crate) const TIMESTAMP_ENCODINGS: [TimestampEncoding; 5] = [
    TimestampEncoding { control_value: 0b10, control_bits: 2, value_bits: 7, max_value: 1 << 6 },
    TimestampEncoding { control_value: 0b110, control_bits: 3, value_bits: 9, max_value: 1 << 8 },
    TimestampEncoding { control_value: 0b1110, control_bits: 4, value_bits: 12, max_value: 1 << 11 },
    TimestampEncoding { control_value: 0b11110, control_bits: 5, value_bits: 32, max_value: 1 << 31 },
    TimestampEncoding { control_value: 0b11111, control_bits: 5, value_bits: 34, max_value: 1 << 33 },
];

/// Longest control prefix a decoder may scan.
pub(crate) const MAX_CONTROL_BITS: u32 = 5;

/// Worst-case bits one timestamp can cost (last bucket control plus value).
pub(crate) const MAX_TIMESTAMP_BITS: usize = 39;

/// Rolling timestamp state, mirrored by the segment header and by every
/// decode cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TimestampState {
    pub previous_timestamp: i32,
    pub previous_delta: i32,
}

/// Encode one time offset. `first` selects the raw form used for the opening
/// entry of a segment.
pub(crate) fn encode(state: &mut TimestampState, bits: &mut BitsBuffer<'_>, offset: u32, first: bool) {
    if first {
        bits.append(u64::from(offset), FIRST_TIMESTAMP_BITS);
        state.previous_timestamp = offset as i32;
        state.previous_delta = DEFAULT_DELTA;
        return;
    }

    let delta = i64::from(offset as i32) - i64::from(state.previous_timestamp);
    let mut delta_of_delta = delta - i64::from(state.previous_delta);
    state.previous_timestamp = offset as i32;
    state.previous_delta = delta as i32;

    if delta_of_delta == 0 {
        bits.append(0, 1);
        return;
    }
    if delta_of_delta > 0 {
        // Zero belongs to the steady-interval code; shift positives down so
        // the bucket payload has no redundant representation.
        delta_of_delta -= 1;
    }

    let abs = delta_of_delta.abs();
    let bucket = TIMESTAMP_ENCODINGS
        .iter()
        .find(|encoding| abs < encoding.max_value)
        .unwrap_or(&TIMESTAMP_ENCODINGS[TIMESTAMP_ENCODINGS.len() - 1]);
    bits.append(bucket.control_value, bucket.control_bits);
    // Bias into [0, 2 * max_value).
    bits.append((delta_of_delta + bucket.max_value) as u64, bucket.value_bits);
}

/// Decode one time offset, mirroring `encode`.
pub(crate) fn decode(
    state: &mut TimestampState,
    bits: &BitsSlice<'_>,
    cursor: &mut usize,
    first: bool,
) -> Result<u32, DecodeError> {
    if first {
        let raw = bits.read(cursor, FIRST_TIMESTAMP_BITS)?;
        state.previous_timestamp = raw as i32;
        state.previous_delta = DEFAULT_DELTA;
        return Ok(raw as u32);
    }

    let ones = bits.scan_until_zero(cursor, MAX_CONTROL_BITS)?;
    if ones > 0 {
        let encoding = &TIMESTAMP_ENCODINGS[(ones - 1) as usize];
        let mut value = bits.read(cursor, encoding.value_bits)? as i64 - encoding.max_value;
        if value >= 0 {
            // Reverse the shift that freed up the zero code.
            value += 1;
        }
        state.previous_delta = (i64::from(state.previous_delta) + value) as i32;
    }
    state.previous_timestamp = state.previous_timestamp.wrapping_add(state.previous_delta);
    Ok(state.previous_timestamp as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::RESERVED_PREFIX_BITS;

    fn roundtrip(offsets: &[u32]) {
        let mut region = vec![0u8; 512];
        let mut bits = BitsBuffer::new(&mut region);
        bits.initialize();
        let mut state = TimestampState::default();
        for (i, &offset) in offsets.iter().enumerate() {
            encode(&mut state, &mut bits, offset, i == 0);
        }

        let slice = BitsSlice::new(&region);
        let mut cursor = RESERVED_PREFIX_BITS;
        let mut state = TimestampState::default();
        for (i, &offset) in offsets.iter().enumerate() {
            assert_eq!(decode(&mut state, &slice, &mut cursor, i == 0).unwrap(), offset);
        }
        assert_eq!(cursor, slice.position());
    }

    #[test]
    fn steady_interval_roundtrip() {
        roundtrip(&[0, 60, 120, 180, 240]);
    }

    #[test]
    fn concrete_sequence_roundtrip() {
        roundtrip(&[50, 70, 80, 170]);
    }

    #[test]
    fn bucket_edges_roundtrip() {
        // Interval changes picked so the shifted delta-of-delta lands on the
        // top of one bucket and the bottom of the next.
        roundtrip(&[0, 60, 184, 373, 819, 3314]);
        roundtrip(&[10_000, 10_060, 10_057, 9_000, 20_000]);
    }

    #[test]
    fn large_jump_uses_the_wide_buckets() {
        roundtrip(&[0, 1_000_000_000, 1_000_000_060, 2_000_000_000]);
        // Reversals between extreme offsets exercise the overflow bucket.
        roundtrip(&[2_147_483_647, 0, 2_147_483_647]);
    }

    #[test]
    fn steady_interval_costs_one_bit() {
        let mut region = vec![0u8; 512];
        let mut bits = BitsBuffer::new(&mut region);
        bits.initialize();
        let mut state = TimestampState::default();
        encode(&mut state, &mut bits, 0, true);
        encode(&mut state, &mut bits, 60, false);
        let before = bits.position();
        encode(&mut state, &mut bits, 120, false);
        assert_eq!(bits.position() - before, 1);
    }

    #[test]
    fn non_monotonic_offsets_roundtrip() {
        roundtrip(&[500, 400, 900, 100]);
    }
}
