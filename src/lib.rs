//! `tagpack` - dense segment compression for multi-column time series
//!
//! A bit-packed, append-only binary format for numeric samples that share a
//! timestamp, a fixed set of f64 columns and one byte-string tag per entry.
//! Timestamps use delta-of-delta encoding, values use XOR encoding with a
//! significant-bit window, and repeated tags collapse into back-references,
//! so regular streams cost a few bits per entry after the first.
//!
//! # Features
//! - **All-or-nothing appends**: an entry is encoded into a scratch buffer
//!   and transplanted only when it provably fits, so a full segment is never
//!   left half written - `append` just returns `false` and the caller rolls
//!   over to a new segment.
//! - **Caller-owned memory**: a segment is a view over a byte region the
//!   caller allocates and persists; the codec performs no I/O and no
//!   allocation beyond one bounded scratch buffer per append.
//! - **Replayable decode**: cursors are cheap, independent views that replay
//!   the payload from the start with their own rolling state.
//!
//! # Example
//! ```
//! use tagpack::{ColumnState, Segment};
//!
//! let mut region = vec![0u8; 1024];
//! let mut segment = Segment::initialize(&mut region, 2).unwrap();
//!
//! // Offsets are in whatever unit the caller measures from its epoch.
//! assert!(segment.append(50, &[2.0, 3.0], b"hello").unwrap());
//! assert!(segment.append(70, &[23.0, 153.0], b"hello 2").unwrap());
//! assert!(segment.append(80, &[12.0, 3.0], b"world").unwrap());
//!
//! let mut values = [ColumnState::default(); 2];
//! let mut cursor = segment.entries();
//! while let Some(entry) = cursor.next_entry(&mut values).unwrap() {
//!     println!("{} {} {}", entry.timestamp, values[0].value(), values[1].value());
//! }
//! ```
//!
//! # Wire Format
//!
//! ## Region layout
//!
//! | Region | Size | Contents |
//! |--------|------|----------|
//! | Header | 16 B | `previous_timestamp: i32`, `previous_delta: i32`, `number_of_values: u8`, `number_of_entries: u16`, `previous_tag_position: u16`, `last_tag_position: u16`, reserved |
//! | Column registers | 10 B x columns | per column: raw bits of the last value (`u64`), leading zeros (`u8`), trailing zeros (`u8`) |
//! | Payload | remainder | `u16` bit cursor, 3-bit reserved prefix, then the entry stream |
//!
//! All header fields are little-endian; the bit stream packs values
//! most-significant-bit first. A segment holds 1-32 columns in at most
//! 65,535 bytes, and the 16-bit cursor bounds the payload at 65,535 bits.
//!
//! ## Entry stream
//!
//! Each entry is a timestamp code, one value code per column, then a tag
//! code:
//!
//! | Code | Encoding |
//! |------|----------|
//! | first timestamp | raw 31-bit offset |
//! | steady interval | `0` |
//! | interval change | unary bucket prefix + biased change in 7/9/12/32/34 bits |
//! | unchanged value | `0` |
//! | value, reused window | `1 1` + significant bits in the previous window |
//! | value, fresh window | `1 0` + 5-bit leading zeros + 6-bit size + significant bits |
//! | same tag as previous entry | `0` |
//! | tag by reference | `1 1` + 16-bit record position |
//! | new tag record | `1 0` + 16-bit self pointer + record |
//!
//! A tag record is `[back pointer: 16 bits][pad to byte boundary]
//! [length: 8 bits][bytes]`; records chain backwards newest-first and the
//! encoder searches at most 8 of them before storing a tag again.
//!
//! # Concurrency
//!
//! Every operation is a bounded, synchronous bit-manipulation loop. One
//! writer at a time per segment; any number of cursors may read concurrently
//! with each other. Rust's borrow rules already prevent appending while a
//! cursor from the same `Segment` is alive - with multiple views over one
//! region (for example via snapshots), that serialization is the caller's
//! responsibility.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod bits;
mod constants;
mod error;
mod segment;
mod tag;
mod timestamp;
mod xor;

#[cfg(test)]
mod tests;

// Re-export public API
pub use error::{AppendError, DecodeError};
pub use segment::{Entry, Segment, SegmentCursor};
pub use xor::ColumnState;
