//! Encoding of vendor id lists.
//!
//! A list of vendors is written either as a bitfield, where each bit tells whether
//! the vendor with that id is part of the list, or as a list of ranges of contiguous
//! ids. The optimized form picks whichever is shorter.
use crate::core::{DataWriter, ToDataWriter};
use crate::sections::{EncodeError, IdSet};
use num_iter::range_inclusive;

const RANGE_ENTRY_SINGLE_BITS: u64 = 1 + 16;
const RANGE_ENTRY_GROUP_BITS: u64 = 1 + 16 + 16;
const NUM_ENTRIES_BITS: u64 = 12;
const HEADER_BITS: u64 = 16 + 1;

/// A run of contiguous vendor ids, `start` and `end` included.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RangeEntry {
    pub start: u16,
    pub end: u16,
}

impl RangeEntry {
    pub fn is_group(&self) -> bool {
        self.start != self.end
    }

    fn bit_len(&self) -> u64 {
        if self.is_group() {
            RANGE_ENTRY_GROUP_BITS
        } else {
            RANGE_ENTRY_SINGLE_BITS
        }
    }
}

/// Computes the runs of contiguous ids over `1..=max(ids)`.
///
/// When `default_consent` is set, the runs cover the ids which are absent from `ids`.
pub fn ranges(ids: &IdSet, default_consent: bool) -> Vec<RangeEntry> {
    let Some(&max_vendor_id) = ids.last() else {
        return vec![];
    };

    let mut entries = vec![];
    let mut current: Option<RangeEntry> = None;

    for id in range_inclusive(1, max_vendor_id) {
        let included = ids.contains(&id) != default_consent;
        match (included, current.as_mut()) {
            (true, Some(entry)) => entry.end = id,
            (true, None) => current = Some(RangeEntry { start: id, end: id }),
            (false, Some(_)) => entries.extend(current.take()),
            (false, None) => {}
        }
    }
    entries.extend(current);

    entries
}

/// Size in bits of a range encoding, `num_entries` field included.
pub fn range_bit_len(entries: &[RangeEntry]) -> u64 {
    NUM_ENTRIES_BITS + entries.iter().map(RangeEntry::bit_len).sum::<u64>()
}

#[derive(Debug, Eq, PartialEq)]
pub enum VendorEncoding {
    BitField {
        max_vendor_id: u16,
        ids: IdSet,
    },
    Range {
        max_vendor_id: u16,
        entries: Vec<RangeEntry>,
    },
}

impl VendorEncoding {
    pub fn bitfield(ids: &IdSet) -> Self {
        Self::BitField {
            max_vendor_id: max_vendor_id(ids),
            ids: ids.clone(),
        }
    }

    pub fn range(ids: &IdSet, default_consent: bool) -> Self {
        Self::Range {
            max_vendor_id: max_vendor_id(ids),
            entries: ranges(ids, default_consent),
        }
    }

    /// Returns the shortest encoding for the given ids, preferring the bitfield on a tie.
    pub fn optimized(ids: &IdSet, default_consent: bool) -> Self {
        let bitfield = Self::bitfield(ids);
        let range = Self::range(ids, default_consent);

        if range.bit_len() < bitfield.bit_len() {
            range
        } else {
            bitfield
        }
    }

    pub fn max_vendor_id(&self) -> u16 {
        match self {
            Self::BitField { max_vendor_id, .. } | Self::Range { max_vendor_id, .. } => {
                *max_vendor_id
            }
        }
    }

    /// Size in bits of this encoding, `max_vendor_id` and encoding type header included.
    pub fn bit_len(&self) -> u64 {
        HEADER_BITS
            + match self {
                Self::BitField { max_vendor_id, .. } => u64::from(*max_vendor_id),
                Self::Range { max_vendor_id: 0, .. } => 0,
                Self::Range { entries, .. } => range_bit_len(entries),
            }
    }
}

impl ToDataWriter for VendorEncoding {
    type Err = EncodeError;

    fn to_data_writer(&self, w: &mut DataWriter) -> Result<(), Self::Err> {
        w.write_fixed_integer("max_vendor_id", self.max_vendor_id(), 16)?;

        match self {
            // an empty list is only made of its header
            Self::BitField { max_vendor_id, .. } | Self::Range { max_vendor_id, .. }
                if *max_vendor_id == 0 =>
            {
                w.write_bool(false)
            }
            Self::BitField { max_vendor_id, ids } => {
                w.write_bool(false)?;
                w.write_fixed_bitfield(ids, *max_vendor_id)
            }
            Self::Range { entries, .. } => {
                w.write_bool(true)?;
                w.write_integer_range(entries)
            }
        }
    }
}

impl DataWriter {
    /// Writes a list of ranges, prefixed by its 12 bits length.
    pub fn write_integer_range(&mut self, entries: &[RangeEntry]) -> Result<(), EncodeError> {
        self.write_fixed_integer("num_entries", entries.len(), 12)?;

        for entry in entries {
            self.write_bool(entry.is_group())?;
            self.write_fixed_integer("vendor_id", entry.start, 16)?;
            if entry.is_group() {
                self.write_fixed_integer("vendor_id", entry.end, 16)?;
            }
        }

        Ok(())
    }

    /// Writes the shortest of the bitfield and range encodings, preceded by
    /// the `max_vendor_id` and `is_range_encoding` header.
    pub fn write_optimized_integer_range(&mut self, ids: &IdSet) -> Result<(), EncodeError> {
        self.write(&VendorEncoding::optimized(ids, false))
    }
}

fn max_vendor_id(ids: &IdSet) -> u16 {
    ids.last().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tests::bits;
    use test_case::test_case;

    fn set(ids: &[u16]) -> IdSet {
        ids.iter().copied().collect()
    }

    fn r(start: u16, end: u16) -> RangeEntry {
        RangeEntry { start, end }
    }

    #[test_case(&[], false => Vec::<RangeEntry>::new() ; "empty")]
    #[test_case(&[3], false => vec![r(3, 3)] ; "single")]
    #[test_case(&[3, 5, 6, 7, 8], false => vec![r(3, 3), r(5, 8)] ; "single and group")]
    #[test_case(&[1000, 1001, 1002, 1003, 1004], false => vec![r(1000, 1004)] ; "high ids")]
    #[test_case(&[2, 6, 8], true => vec![r(1, 1), r(3, 5), r(7, 7)] ; "default consent")]
    #[test_case(&[1, 2, 3], true => Vec::<RangeEntry>::new() ; "default consent all present")]
    fn compute_ranges(ids: &[u16], default_consent: bool) -> Vec<RangeEntry> {
        ranges(&set(ids), default_consent)
    }

    #[test_case(&[], "0000000000000000 0" ; "empty")]
    #[test_case(&[2, 6, 8], "0000000000001000 0 01000101" ; "bitfield")]
    #[test_case(&[1000, 1001, 1002, 1003, 1004], "0000001111101100 1 000000000001 1 0000001111101000 0000001111101100" ; "range")]
    fn write_optimized_integer_range(ids: &[u16], expected: &str) {
        assert_eq!(
            bits(|w| w.write_optimized_integer_range(&set(ids))),
            expected.replace(' ', "")
        );
    }

    #[test_case(&[3, 5, 6, 7, 8], "000000000010 0 0000000000000011 1 0000000000000101 0000000000001000" ; "mixed")]
    #[test_case(&[], "000000000000" ; "empty")]
    fn write_integer_range(ids: &[u16], expected: &str) {
        assert_eq!(
            bits(|w| w.write_integer_range(&ranges(&set(ids), false))),
            expected.replace(' ', "")
        );
    }

    #[test]
    fn default_consent_without_gaps() {
        let e = VendorEncoding::range(&set(&[1, 2, 3]), true);
        assert_eq!(e.bit_len(), 29);
        assert_eq!(
            bits(|w| w.write(&e)),
            "0000000000000011 1 000000000000".replace(' ', "")
        );
    }

    #[test]
    fn empty_range_encoding_is_header_only() {
        let e = VendorEncoding::range(&IdSet::new(), false);
        assert_eq!(e.bit_len(), 17);
        assert_eq!(bits(|w| w.write(&e)), "00000000000000000");
    }

    #[test_case(&[2, 6, 8] => false ; "short bitfield")]
    #[test_case(&[1000, 1001, 1002, 1003, 1004] => true ; "long contiguous run")]
    #[test_case(&[29] => false ; "tie prefers bitfield")]
    #[test_case(&[30] => true ; "single high id")]
    #[test_case(&[1, 2000] => true ; "sparse")]
    fn optimized_choice(ids: &[u16]) -> bool {
        matches!(
            VendorEncoding::optimized(&set(ids), false),
            VendorEncoding::Range { .. }
        )
    }

    #[test]
    fn optimized_is_never_longer() {
        let cases: [&[u16]; 7] = [
            &[],
            &[1],
            &[1, 3, 5, 7, 9, 11],
            &[10, 11, 12, 40, 41, 42, 43],
            &[100, 200, 300],
            &[5000],
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20],
        ];

        for ids in cases {
            let ids = set(ids);
            for default_consent in [false, true] {
                let chosen = VendorEncoding::optimized(&ids, default_consent);
                let bitfield = VendorEncoding::bitfield(&ids);
                let range = VendorEncoding::range(&ids, default_consent);

                assert!(chosen.bit_len() <= bitfield.bit_len().min(range.bit_len()));

                let written = bits(|w| w.write(&chosen));
                assert_eq!(written.len() as u64, chosen.bit_len(), "ids {ids:?}");
            }
        }
    }

    #[test]
    fn too_many_ranges() {
        let ids = (1..=8192u16).step_by(2).collect::<IdSet>();
        let entries = ranges(&ids, false);
        assert_eq!(entries.len(), 4096);

        let r = DataWriter::new().write_integer_range(&entries);
        assert!(matches!(
            r,
            Err(EncodeError::FieldOverflow {
                field: "num_entries",
                value: 4096,
                bits: 12
            })
        ));
    }
}
