use super::collect_entries;
use crate::Segment;
use proptest::prelude::*;

const TAG_POOL: [&[u8]; 6] = [
    b"host-a",
    b"host-b",
    b"sensors/1",
    b"sensors/2/humidity",
    b"",
    b"watches/fitbit",
];

/// Generate tests for a specific column count using a macro
macro_rules! proptest_columns {
    ($columns:expr, $mod_name:ident) => {
        mod $mod_name {
            use super::*;

            prop_compose! {
                /// Strictly increasing offsets, arbitrary f64 bit patterns
                /// per column and tags drawn from a small pool.
                fn arb_entries()(
                    count in 0usize..120,
                )(
                    start in 0u32..1_000_000,
                    deltas in prop::collection::vec(1u32..5_000, count),
                    values in prop::collection::vec(
                        prop::collection::vec(any::<f64>(), $columns),
                        count,
                    ),
                    tags in prop::collection::vec(0usize..TAG_POOL.len(), count),
                ) -> Vec<(u32, Vec<f64>, &'static [u8])> {
                    let mut offset = start;
                    deltas.iter().zip(values).zip(tags)
                        .map(|((&delta, vals), tag)| {
                            let entry = (offset, vals, TAG_POOL[tag]);
                            offset += delta;
                            entry
                        })
                        .collect()
                }
            }

            /// Append as much as fits, returning what actually landed.
            fn append_all<'a>(
                segment: &mut Segment<'_>,
                entries: Vec<(u32, Vec<f64>, &'a [u8])>,
            ) -> Vec<(u32, Vec<f64>, &'a [u8])> {
                let mut landed = Vec::new();
                for (offset, values, tag) in entries {
                    if !segment.append(offset, &values, tag).unwrap() {
                        break;
                    }
                    landed.push((offset, values, tag));
                }
                landed
            }

            proptest! {
                /// Property: decoding reproduces every appended tuple
                /// exactly, in order, down to the value bit patterns.
                #[test]
                fn prop_roundtrip_exact(entries in arb_entries()) {
                    let mut region = vec![0u8; 8192];
                    let mut segment = Segment::initialize(&mut region, $columns).unwrap();
                    let expected = append_all(&mut segment, entries);

                    let decoded = collect_entries(&segment);
                    prop_assert_eq!(decoded.len(), expected.len());
                    for (got, (offset, values, tag)) in decoded.iter().zip(expected.iter()) {
                        prop_assert_eq!(got.0, *offset);
                        for (bits, value) in got.1.iter().zip(values.iter()) {
                            prop_assert_eq!(*bits, value.to_bits());
                        }
                        prop_assert_eq!(got.2.as_slice(), *tag);
                    }
                }

                /// Property: a declined append leaves the region and the
                /// decoded content byte-for-byte unchanged.
                #[test]
                fn prop_full_segment_stays_intact(entries in arb_entries()) {
                    let mut region = vec![0u8; 512];
                    let mut segment = Segment::initialize(&mut region, $columns).unwrap();

                    let mut landed = 0usize;
                    for (offset, values, tag) in entries {
                        let snapshot = segment.as_bytes().to_vec();
                        if segment.append(offset, &values, tag).unwrap() {
                            landed += 1;
                        } else {
                            prop_assert_eq!(segment.as_bytes(), snapshot.as_slice());
                        }
                    }
                    prop_assert_eq!(segment.number_of_entries(), landed);
                    prop_assert_eq!(collect_entries(&segment).len(), landed);
                }

                /// Property: re-attaching to the raw region decodes the same
                /// entries as the segment that wrote them.
                #[test]
                fn prop_reattach_decodes_identically(entries in arb_entries()) {
                    let mut region = vec![0u8; 8192];
                    let written = {
                        let mut segment = Segment::initialize(&mut region, $columns).unwrap();
                        append_all(&mut segment, entries);
                        collect_entries(&segment)
                    };

                    let reopened = Segment::new(&mut region).unwrap();
                    prop_assert_eq!(collect_entries(&reopened), written);
                }

                /// Property: the entry counter always matches a full decode.
                #[test]
                fn prop_count_consistency(entries in arb_entries()) {
                    let mut region = vec![0u8; 4096];
                    let mut segment = Segment::initialize(&mut region, $columns).unwrap();
                    let expected = append_all(&mut segment, entries);

                    prop_assert_eq!(segment.number_of_entries(), expected.len());
                    prop_assert_eq!(collect_entries(&segment).len(), expected.len());
                }
            }
        }
    };
}

// Generate property tests for narrow and wide segments
proptest_columns!(1, columns_1);
proptest_columns!(2, columns_2);
proptest_columns!(5, columns_5);
