//! Shared limits and field widths for the segment wire format.

/// Maximum number of value columns a segment can hold.
pub(crate) const MAX_NUMBER_OF_VALUES: usize = 32;

/// Maximum byte size of a segment region (positions are 16-bit).
pub(crate) const MAX_SEGMENT_CAPACITY: usize = 65_535;

/// Seed for the rolling delta before the second entry establishes a real one.
pub(crate) const DEFAULT_DELTA: i32 = 60;

/// Width of the raw timestamp field used for the first entry of a segment.
pub(crate) const FIRST_TIMESTAMP_BITS: u8 = 31;

/// Largest appendable time offset; bounded by the first-entry field width.
pub(crate) const MAX_TIMESTAMP_OFFSET: u32 = (1 << 31) - 1;

/// Width of the leading-zero count in a fresh XOR window declaration.
pub(crate) const LEADING_ZEROS_BITS: u8 = 5;

/// Leading-zero counts are capped so they fit the 5-bit field.
pub(crate) const MAX_LEADING_ZEROS: u32 = (1 << LEADING_ZEROS_BITS) - 1;

/// Width of the block-size field in a fresh XOR window declaration.
pub(crate) const BLOCK_SIZE_BITS: u8 = 6;

/// Block sizes are stored minus one so a full 64-bit block fits the field.
pub(crate) const BLOCK_SIZE_ADJUSTMENT: u32 = 1;

/// Width of tag record position fields (matches the 16-bit payload cursor).
pub(crate) const TAG_POSITION_BITS: u8 = 16;

/// Width of the tag length prefix.
pub(crate) const TAG_LENGTH_BITS: u8 = 8;

/// Longest storable tag, bounded by the one-byte length prefix.
pub(crate) const MAX_TAG_LENGTH: usize = 255;

/// Records compared per append before a repeated tag is stored again.
/// Bounds the backward chain walk at a fixed cost.
pub(crate) const TAG_SEARCH_DEPTH: usize = 8;
