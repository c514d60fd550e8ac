//! Fixed-capacity segment: header, per-column registers and the bit-packed
//! entry stream, with all-or-nothing appends and a forward-only decode
//! cursor.

use crate::bits::{BitsBuffer, BitsSlice, CURSOR_BYTES, RESERVED_PREFIX_BITS};
use crate::constants::{
    MAX_NUMBER_OF_VALUES, MAX_SEGMENT_CAPACITY, MAX_TAG_LENGTH, MAX_TIMESTAMP_OFFSET,
};
use crate::error::{AppendError, DecodeError};
use crate::tag::{self, TagSpan};
use crate::timestamp::{self, TimestampState, MAX_TIMESTAMP_BITS};
use crate::xor::{self, ColumnState, MAX_VALUE_BITS};

/// Size of the fixed segment header.
pub(crate) const HEADER_SIZE: usize = 16;

// Header field offsets. All fields are little-endian and accessed through
// explicit pack/unpack, never struct overlays.
const OFF_PREVIOUS_TIMESTAMP: usize = 0;
const OFF_PREVIOUS_DELTA: usize = 4;
const OFF_NUMBER_OF_VALUES: usize = 8;
const OFF_NUMBER_OF_ENTRIES: usize = 9;
const OFF_PREVIOUS_TAG_POSITION: usize = 11;
const OFF_LAST_TAG_POSITION: usize = 13;

#[inline]
fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

#[inline]
fn write_u16_le(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn read_i32_le(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

#[inline]
fn write_i32_le(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// In-memory copy of the header fields. Appends mutate a copy and commit it
/// back only after the entry is fully encoded and transplanted.
#[derive(Debug, Clone, Copy, Default)]
struct SegmentHeader {
    timestamps: TimestampState,
    number_of_values: u8,
    number_of_entries: u16,
    previous_tag_position: u16,
    last_tag_position: u16,
}

/// A fixed-capacity segment over a caller-supplied byte region.
///
/// Layout: 16-byte header, one 10-byte [`ColumnState`] register per column,
/// then the bit-packed payload. The region's allocation, persistence and any
/// cross-writer locking belong to the caller; the segment never allocates
/// beyond one bounded scratch buffer per append.
pub struct Segment<'a> {
    buf: &'a mut [u8],
}

impl<'a> Segment<'a> {
    /// Set up a fresh segment with `number_of_values` columns, zeroing the
    /// whole region.
    ///
    /// # Errors
    /// Fails when the column count is zero or above 32, the region exceeds
    /// the 65,535-byte ceiling, or the region cannot hold the header, the
    /// column registers and a minimal payload.
    pub fn initialize(buf: &'a mut [u8], number_of_values: usize) -> Result<Self, AppendError> {
        if number_of_values == 0 || number_of_values > MAX_NUMBER_OF_VALUES {
            return Err(AppendError::TooManyValues {
                requested: number_of_values,
            });
        }
        if buf.len() > MAX_SEGMENT_CAPACITY {
            return Err(AppendError::CapacityOutOfRange { capacity: buf.len() });
        }
        let required = HEADER_SIZE + number_of_values * ColumnState::SIZE + CURSOR_BYTES + 1;
        if buf.len() < required {
            return Err(AppendError::BufferTooSmall {
                required,
                actual: buf.len(),
            });
        }

        buf.fill(0);
        buf[OFF_NUMBER_OF_VALUES] = number_of_values as u8;
        let mut segment = Self { buf };
        segment.bits_buffer().initialize();
        Ok(segment)
    }

    /// Re-attach to a region previously set up by [`Segment::initialize`],
    /// for example after it was persisted and read back.
    ///
    /// # Errors
    /// Fails when the region is too small, too large, or its header does not
    /// describe a plausible segment.
    pub fn new(buf: &'a mut [u8]) -> Result<Self, AppendError> {
        if buf.len() > MAX_SEGMENT_CAPACITY {
            return Err(AppendError::CapacityOutOfRange { capacity: buf.len() });
        }
        if buf.len() < HEADER_SIZE + ColumnState::SIZE + CURSOR_BYTES + 1 {
            return Err(AppendError::BufferTooSmall {
                required: HEADER_SIZE + ColumnState::SIZE + CURSOR_BYTES + 1,
                actual: buf.len(),
            });
        }
        let number_of_values = usize::from(buf[OFF_NUMBER_OF_VALUES]);
        if number_of_values == 0 || number_of_values > MAX_NUMBER_OF_VALUES {
            return Err(AppendError::InvalidHeader);
        }
        let required = HEADER_SIZE + number_of_values * ColumnState::SIZE + CURSOR_BYTES + 1;
        if buf.len() < required {
            return Err(AppendError::BufferTooSmall {
                required,
                actual: buf.len(),
            });
        }

        let segment = Self { buf };
        let bits = segment.bits_slice();
        if bits.position() < RESERVED_PREFIX_BITS || bits.position() > bits.capacity_bits() {
            return Err(AppendError::InvalidHeader);
        }
        Ok(segment)
    }

    /// Number of value columns per entry, fixed at initialization.
    #[must_use]
    pub fn number_of_values(&self) -> usize {
        usize::from(self.buf[OFF_NUMBER_OF_VALUES])
    }

    /// Number of entries appended so far.
    #[must_use]
    pub fn number_of_entries(&self) -> usize {
        usize::from(read_u16_le(self.buf, OFF_NUMBER_OF_ENTRIES))
    }

    /// Whether no entry has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits_slice().position() == RESERVED_PREFIX_BITS
    }

    /// Size of the backing region in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bits of payload written so far, including the reserved prefix.
    #[must_use]
    pub fn bits_used(&self) -> usize {
        self.bits_slice().position()
    }

    /// The raw backing region, for callers that persist segments.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf
    }

    /// Append one entry: a time offset, one value per column and a tag.
    ///
    /// Returns `Ok(false)` without touching the segment when the remaining
    /// capacity cannot be proven to fit a worst-case encoding of the entry,
    /// or when the entry counter is saturated; the caller rolls over to a
    /// new segment. Entries are normally appended in increasing offset
    /// order, which is what the format compresses well, but the codec does
    /// not require it.
    ///
    /// # Errors
    /// Misuse only: wrong number of values, a tag above 255 bytes, or an
    /// offset outside the 31-bit range.
    pub fn append(&mut self, time_offset: u32, values: &[f64], tag: &[u8]) -> Result<bool, AppendError> {
        let mut header = self.read_header();
        let number_of_values = usize::from(header.number_of_values);
        if values.len() != number_of_values {
            return Err(AppendError::ValueCountMismatch {
                expected: number_of_values,
                actual: values.len(),
            });
        }
        if tag.len() > MAX_TAG_LENGTH {
            return Err(AppendError::TagTooLong { len: tag.len() });
        }
        if time_offset > MAX_TIMESTAMP_OFFSET {
            return Err(AppendError::TimestampOutOfRange {
                offset: time_offset,
            });
        }
        if header.number_of_entries == u16::MAX {
            return Ok(false);
        }

        // A cheap upper bound on the entry's encoded size; the exact size is
        // not known until encoded. Checking the bound up front is what makes
        // the later transplant infallible.
        let worst_case = MAX_TIMESTAMP_BITS
            + number_of_values * MAX_VALUE_BITS
            + tag::MAX_TAG_CODE_BITS
            + tag.len() * 8;

        let mut registers = [ColumnState::default(); MAX_NUMBER_OF_VALUES];
        let states = &mut registers[..number_of_values];
        let mut scratch = vec![0u8; CURSOR_BYTES + (RESERVED_PREFIX_BITS + worst_case + 7) / 8 + 1];

        {
            let live = self.bits_slice();
            if live.position() + worst_case > live.capacity_bits() {
                return Ok(false);
            }
            let first = live.position() == RESERVED_PREFIX_BITS;
            let bias = live.position() - RESERVED_PREFIX_BITS;
            self.read_column_states(states);

            let mut bits = BitsBuffer::new(&mut scratch);
            bits.initialize();
            timestamp::encode(&mut header.timestamps, &mut bits, time_offset, first);
            for (state, &value) in states.iter_mut().zip(values) {
                xor::encode(state, &mut bits, value);
            }
            let update = tag::encode(
                &live,
                &mut bits,
                bias,
                header.previous_tag_position,
                header.last_tag_position,
                tag,
            );
            header.previous_tag_position = update.previous_tag_position;
            header.last_tag_position = update.last_tag_position;
            debug_assert!(bits.position() - RESERVED_PREFIX_BITS <= worst_case);
        }

        if !self.bits_buffer().extend_from(&BitsSlice::new(&scratch)) {
            // The capacity pre-check makes this unreachable; declining keeps
            // the live buffer untouched either way.
            return Ok(false);
        }
        header.number_of_entries += 1;
        self.write_header(&header);
        self.write_column_states(states);
        Ok(true)
    }

    /// A forward-only cursor over the segment's entries, replaying from the
    /// start of the payload with its own rolling state.
    #[must_use]
    pub fn entries(&self) -> SegmentCursor<'_> {
        SegmentCursor {
            bits: self.bits_slice(),
            position: RESERVED_PREFIX_BITS,
            number_of_values: self.number_of_values(),
            timestamps: TimestampState::default(),
            tag: TagSpan::default(),
        }
    }

    fn data_start(&self) -> usize {
        HEADER_SIZE + self.number_of_values() * ColumnState::SIZE
    }

    fn bits_buffer(&mut self) -> BitsBuffer<'_> {
        let start = self.data_start();
        BitsBuffer::new(&mut self.buf[start..])
    }

    fn bits_slice(&self) -> BitsSlice<'_> {
        BitsSlice::new(&self.buf[self.data_start()..])
    }

    fn read_header(&self) -> SegmentHeader {
        SegmentHeader {
            timestamps: TimestampState {
                previous_timestamp: read_i32_le(self.buf, OFF_PREVIOUS_TIMESTAMP),
                previous_delta: read_i32_le(self.buf, OFF_PREVIOUS_DELTA),
            },
            number_of_values: self.buf[OFF_NUMBER_OF_VALUES],
            number_of_entries: read_u16_le(self.buf, OFF_NUMBER_OF_ENTRIES),
            previous_tag_position: read_u16_le(self.buf, OFF_PREVIOUS_TAG_POSITION),
            last_tag_position: read_u16_le(self.buf, OFF_LAST_TAG_POSITION),
        }
    }

    fn write_header(&mut self, header: &SegmentHeader) {
        write_i32_le(self.buf, OFF_PREVIOUS_TIMESTAMP, header.timestamps.previous_timestamp);
        write_i32_le(self.buf, OFF_PREVIOUS_DELTA, header.timestamps.previous_delta);
        self.buf[OFF_NUMBER_OF_VALUES] = header.number_of_values;
        write_u16_le(self.buf, OFF_NUMBER_OF_ENTRIES, header.number_of_entries);
        write_u16_le(self.buf, OFF_PREVIOUS_TAG_POSITION, header.previous_tag_position);
        write_u16_le(self.buf, OFF_LAST_TAG_POSITION, header.last_tag_position);
    }

    fn read_column_states(&self, states: &mut [ColumnState]) {
        for (index, state) in states.iter_mut().enumerate() {
            let offset = HEADER_SIZE + index * ColumnState::SIZE;
            *state = ColumnState::read_from(&self.buf[offset..offset + ColumnState::SIZE]);
        }
    }

    fn write_column_states(&mut self, states: &[ColumnState]) {
        for (index, state) in states.iter().enumerate() {
            let offset = HEADER_SIZE + index * ColumnState::SIZE;
            state.write_to(&mut self.buf[offset..offset + ColumnState::SIZE]);
        }
    }
}

/// One decoded entry. The column values live in the caller's
/// [`ColumnState`] slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub timestamp: u32,
    pub tag: &'a [u8],
}

/// Forward-only decode cursor.
///
/// The cursor keeps its own rolling timestamp and tag state; the caller's
/// `ColumnState` slice passed to [`SegmentCursor::next_entry`] is the rolling
/// value register between steps, so the same slice must be passed on every
/// call and must not be shared across independent cursors. A finished or
/// abandoned cursor cannot be rewound; create a new one to replay.
pub struct SegmentCursor<'a> {
    bits: BitsSlice<'a>,
    position: usize,
    number_of_values: usize,
    timestamps: TimestampState,
    tag: TagSpan,
}

impl<'a> SegmentCursor<'a> {
    /// Decode the next entry, or `Ok(None)` at the end of the payload.
    ///
    /// Columns the entry did not change keep their previous value in
    /// `values`; on the first call the slice is reset to zeroed registers.
    ///
    /// # Errors
    /// `DecodeError::ValueCountMismatch` when `values` does not match the
    /// segment's column count, otherwise only on corrupt payload data.
    pub fn next_entry(&mut self, values: &mut [ColumnState]) -> Result<Option<Entry<'a>>, DecodeError> {
        if values.len() != self.number_of_values {
            return Err(DecodeError::ValueCountMismatch {
                expected: self.number_of_values,
                actual: values.len(),
            });
        }
        if self.position >= self.bits.position() {
            return Ok(None);
        }

        let first = self.position == RESERVED_PREFIX_BITS;
        if first {
            values.fill(ColumnState::default());
        }

        let timestamp = timestamp::decode(&mut self.timestamps, &self.bits, &mut self.position, first)?;
        for state in values.iter_mut() {
            xor::decode(state, &self.bits, &mut self.position)?;
        }
        tag::decode(&self.bits, &mut self.position, &mut self.tag)?;

        let tag = &self.bits.stream()[self.tag.start..self.tag.start + self.tag.len];
        Ok(Some(Entry { timestamp, tag }))
    }
}
