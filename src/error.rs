//! Error types for segment setup, append and decode operations.

use std::fmt;

/// Error returned when initializing or appending to a segment fails through
/// caller misuse.
///
/// Running out of segment capacity is not an error: `Segment::append`
/// returns `Ok(false)` and leaves the segment untouched, and the caller is
/// expected to roll over to a fresh segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendError {
    /// Requested column count is zero or above the per-segment ceiling
    TooManyValues { requested: usize },
    /// Backing region is larger than 16-bit positions can address
    CapacityOutOfRange { capacity: usize },
    /// Backing region cannot hold the header, column states and cursor
    BufferTooSmall { required: usize, actual: usize },
    /// Region does not carry a valid segment header
    InvalidHeader,
    /// Value slice length does not match the segment's column count
    ValueCountMismatch { expected: usize, actual: usize },
    /// Tag is longer than the one-byte length prefix can record
    TagTooLong { len: usize },
    /// Time offset does not fit the 31-bit first-entry field
    TimestampOutOfRange { offset: u32 },
}

/// Error returned when decoding hits data the encoder could not have written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A read would pass the payload's current write position
    OutOfBounds {
        position: usize,
        requested: u8,
        limit: usize,
    },
    /// A control code, window declaration or tag record is inconsistent
    Malformed { position: usize },
    /// Value slice length does not match the segment's column count
    ValueCountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for AppendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyValues { requested } => {
                write!(f, "segments hold 1 to 32 value columns, requested {requested}")
            }
            Self::CapacityOutOfRange { capacity } => {
                write!(f, "segment capacity {capacity} exceeds the 65535 byte ceiling")
            }
            Self::BufferTooSmall { required, actual } => {
                write!(f, "backing region too small: need at least {required} bytes, got {actual}")
            }
            Self::InvalidHeader => write!(f, "region does not carry a valid segment header"),
            Self::ValueCountMismatch { expected, actual } => {
                write!(f, "expected {expected} values per entry, got {actual}")
            }
            Self::TagTooLong { len } => {
                write!(f, "tag of {len} bytes exceeds the 255 byte limit")
            }
            Self::TimestampOutOfRange { offset } => {
                write!(f, "time offset {offset} does not fit the 31-bit timestamp field")
            }
        }
    }
}

impl std::error::Error for AppendError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                position,
                requested,
                limit,
            } => {
                write!(
                    f,
                    "read of {requested} bits at position {position} passes the write position {limit}"
                )
            }
            Self::Malformed { position } => {
                write!(f, "malformed entry data at bit position {position}")
            }
            Self::ValueCountMismatch { expected, actual } => {
                write!(f, "expected {expected} column states, got {actual}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
