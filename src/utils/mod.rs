// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeSet;

use bio::alphabets::dna;
use itertools::Itertools;

pub mod regions;

/// Reverse complement of a nucleotide sequence.
pub fn rev_comp(seq: &[u8]) -> Vec<u8> {
    dna::revcomp(seq)
}

/// All cyclic rotations of the given repeat unit, starting with the unit itself.
pub fn cyclic_shifts(unit: &[u8]) -> Vec<Vec<u8>> {
    (0..unit.len())
        .map(|i| {
            let mut shifted = unit[i..].to_vec();
            shifted.extend_from_slice(&unit[..i]);
            shifted
        })
        .collect()
}

/// Split a set of positions into maximal runs of consecutive values.
/// Each run is returned as an inclusive `(first, last)` pair.
pub fn contiguous_ranges(positions: &BTreeSet<i64>) -> Vec<(i64, i64)> {
    positions
        .iter()
        .map(|pos| (*pos, *pos))
        .coalesce(|(a_start, a_end), (b_start, b_end)| {
            if b_start == a_end + 1 {
                Ok((a_start, b_end))
            } else {
                Err(((a_start, a_end), (b_start, b_end)))
            }
        })
        .collect()
}

pub(crate) fn is_dna(seq: &[u8]) -> bool {
    !seq.is_empty()
        && seq
            .iter()
            .all(|c| matches!(c, b'A' | b'C' | b'G' | b'T' | b'a' | b'c' | b'g' | b't'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rev_comp() {
        assert_eq!(rev_comp(b"AATTAACCGG"), b"CCGGTTAATT".to_vec());
        assert_eq!(rev_comp(b"GNT"), b"ANC".to_vec());
    }

    #[test]
    fn test_cyclic_shifts() {
        let shifts = cyclic_shifts(b"TTAGGC");
        assert_eq!(shifts.len(), 6);
        assert_eq!(shifts[0], b"TTAGGC".to_vec());
        assert_eq!(shifts[1], b"TAGGCT".to_vec());
        assert_eq!(shifts[5], b"CTTAGG".to_vec());
    }

    #[test]
    fn test_contiguous_ranges_single_position() {
        let positions: BTreeSet<i64> = vec![1].into_iter().collect();
        assert_eq!(contiguous_ranges(&positions), vec![(1, 1)]);
    }

    #[test]
    fn test_contiguous_ranges_from_contiguous_positions() {
        let positions: BTreeSet<i64> = vec![1, 2, 3, 4, 3, 2, 1].into_iter().collect();
        assert_eq!(contiguous_ranges(&positions), vec![(1, 4)]);
    }

    #[test]
    fn test_contiguous_ranges_from_noncontiguous_positions() {
        let positions: BTreeSet<i64> = vec![1, 2, 8, 7, 6, 5].into_iter().collect();
        assert_eq!(contiguous_ranges(&positions), vec![(1, 2), (5, 8)]);
    }

    #[test]
    fn test_contiguous_ranges_with_negative_positions() {
        let positions: BTreeSet<i64> = (-3..2).collect();
        assert_eq!(contiguous_ranges(&positions), vec![(-3, 1)]);
    }

    #[test]
    fn test_is_dna() {
        assert!(is_dna(b"TTAGGC"));
        assert!(!is_dna(b""));
        assert!(!is_dna(b"TTNGGC"));
    }
}
