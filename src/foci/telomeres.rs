// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use bio::pattern_matching::myers::Myers;

use crate::foci::softclips::SoftclipObservation;
use crate::foci::Orientation;
use crate::utils::{cyclic_shifts, rev_comp};

/// Telomeric repeat unit in both orientations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelomereSeqs {
    forward: Vec<u8>,
    reverse: Vec<u8>,
}

impl TelomereSeqs {
    /// Build from the unit in forward (5'->3') orientation; the reverse unit
    /// is its reverse complement.
    pub fn from_forward(unit: &[u8]) -> Self {
        let forward = unit.to_ascii_uppercase();
        let reverse = rev_comp(&forward);
        TelomereSeqs { forward, reverse }
    }

    pub fn get(&self, orientation: Orientation) -> &[u8] {
        match orientation {
            Orientation::Forward => &self.forward,
            Orientation::Reverse => &self.reverse,
        }
    }

    pub fn unit_len(&self) -> usize {
        self.forward.len()
    }

    /// `array_size` tandem copies of the unit in the given orientation.
    pub fn array(&self, orientation: Orientation, array_size: usize) -> Vec<u8> {
        self.get(orientation).repeat(array_size)
    }
}

/// Recognizes telomere arrays at the start of soft-clips.
///
/// A soft-clip carries an array if `array_size` copies of the orientation's
/// repeat unit, started at any of its cyclic rotations, align as an infix of
/// the first `(array_size + 1) * unit_len` clipped bases (read outward from
/// the alignment boundary) with at most `max_edit_distance` edits.
pub struct TelomereArrayMatcher {
    array_len: usize,
    window_len: usize,
    max_edit_distance: u8,
    forward: Vec<Myers<u128>>,
    reverse: Vec<Myers<u128>>,
}

impl TelomereArrayMatcher {
    /// Arrays longer than 128 bases are not supported by the bit-parallel
    /// matcher; callers validate this beforehand.
    pub fn new(telomere_seqs: &TelomereSeqs, array_size: usize, max_edit_distance: u8) -> Self {
        let rotated_arrays = |orientation| {
            cyclic_shifts(telomere_seqs.get(orientation))
                .iter()
                .map(|unit| Myers::<u128>::new(unit.repeat(array_size).iter()))
                .collect()
        };
        let array_len = telomere_seqs.unit_len() * array_size;
        TelomereArrayMatcher {
            array_len,
            window_len: array_len + telomere_seqs.unit_len(),
            max_edit_distance,
            forward: rotated_arrays(Orientation::Forward),
            reverse: rotated_arrays(Orientation::Reverse),
        }
    }

    pub fn array_len(&self) -> usize {
        self.array_len
    }

    /// The clipped bases to search, adjacent to the alignment boundary.
    fn clip_window<'a>(
        &self,
        observation: &SoftclipObservation<'a>,
        orientation: Orientation,
    ) -> Option<&'a [u8]> {
        let seq = observation.sequence;
        let q = observation.query_position;
        if q < 0 || q as usize >= seq.len() {
            return None;
        }
        let q = q as usize;
        match orientation {
            Orientation::Forward => Some(&seq[q..(q + self.window_len).min(seq.len())]),
            Orientation::Reverse => Some(&seq[(q + 1).saturating_sub(self.window_len)..q + 1]),
        }
    }

    pub fn has_softclipped_telo_array(
        &self,
        observation: &SoftclipObservation,
        orientation: Orientation,
    ) -> bool {
        let window = match self.clip_window(observation, orientation) {
            Some(window) => window.to_ascii_uppercase(),
            None => return false,
        };
        let arrays = match orientation {
            Orientation::Forward => &self.forward,
            Orientation::Reverse => &self.reverse,
        };
        arrays.iter().any(|myers| {
            myers
                .find_all_end(window.iter(), self.max_edit_distance)
                .next()
                .is_some()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NEMATODA_TELOMERE_FORWARD;
    use strum::IntoEnumIterator;

    const ALIGNED_SEQ: &[u8] = b"ATGCAAAAAAAAATTTGGA";
    const NON_TELO_UNIT_FORWARD: &[u8] = b"AAAAAA";
    const MIN_TELO_ARRAY_SIZE: usize = 3;

    fn telomere_seqs() -> TelomereSeqs {
        TelomereSeqs::from_forward(NEMATODA_TELOMERE_FORWARD.as_bytes())
    }

    fn matcher(max_edit_distance: u8) -> TelomereArrayMatcher {
        TelomereArrayMatcher::new(&telomere_seqs(), MIN_TELO_ARRAY_SIZE, max_edit_distance)
    }

    /// Read sequence with `clip` attached on the side given by the orientation,
    /// together with the query position of the clip base adjacent to the alignment.
    fn clipped(clip: &[u8], orientation: Orientation) -> (Vec<u8>, i64) {
        match orientation {
            Orientation::Forward => {
                let mut seq = ALIGNED_SEQ.to_vec();
                seq.extend(clip);
                (seq, ALIGNED_SEQ.len() as i64)
            }
            Orientation::Reverse => {
                let mut seq = clip.to_vec();
                seq.extend(ALIGNED_SEQ);
                (seq, clip.len() as i64 - 1)
            }
        }
    }

    fn has_array(matcher: &TelomereArrayMatcher, clip: &[u8], orientation: Orientation) -> bool {
        let (seq, query_position) = clipped(clip, orientation);
        let observation =
            SoftclipObservation::new(&seq, "test_softclipped_read", 200, query_position, clip.len());
        matcher.has_softclipped_telo_array(&observation, orientation)
    }

    /// Substitute the base at `pos` by a different base.
    fn substitute(seq: &mut [u8], pos: usize) {
        seq[pos] = match seq[pos] {
            b'A' => b'C',
            b'C' => b'G',
            b'G' => b'T',
            _ => b'A',
        };
    }

    #[test]
    fn test_nontelomeric_softclips_are_not_recognised() {
        let clip = NON_TELO_UNIT_FORWARD.repeat(MIN_TELO_ARRAY_SIZE);
        assert!(!has_array(&matcher(0), &clip, Orientation::Forward));
    }

    #[test]
    fn test_telomeric_softclips_are_recognised() {
        let seqs = telomere_seqs();
        for orientation in Orientation::iter() {
            let clip = seqs.array(orientation, MIN_TELO_ARRAY_SIZE);
            assert!(has_array(&matcher(0), &clip, orientation));
        }
    }

    #[test]
    fn test_shifted_telomeric_softclips_are_recognised() {
        let seqs = telomere_seqs();
        for orientation in Orientation::iter() {
            for shifted_unit in cyclic_shifts(seqs.get(orientation)) {
                let clip = shifted_unit.repeat(MIN_TELO_ARRAY_SIZE + 1);
                assert!(has_array(&matcher(0), &clip, orientation));
                // without the extra unit, the rotated array is only found via rotation
                let clip = shifted_unit.repeat(MIN_TELO_ARRAY_SIZE);
                assert!(has_array(&matcher(0), &clip, orientation));
            }
        }
    }

    #[test]
    fn test_downstream_telomeric_softclips_are_not_recognised() {
        let seqs = telomere_seqs();
        for orientation in Orientation::iter() {
            let clip = match orientation {
                Orientation::Forward => {
                    let mut clip = NON_TELO_UNIT_FORWARD.repeat(MIN_TELO_ARRAY_SIZE);
                    clip.extend(seqs.array(orientation, MIN_TELO_ARRAY_SIZE));
                    clip
                }
                Orientation::Reverse => {
                    let mut clip = seqs.array(orientation, MIN_TELO_ARRAY_SIZE);
                    clip.extend(rev_comp(NON_TELO_UNIT_FORWARD).repeat(MIN_TELO_ARRAY_SIZE));
                    clip
                }
            };
            assert!(!has_array(&matcher(0), &clip, orientation));
        }
    }

    #[test]
    fn test_mutated_telomeres_are_recognised() {
        let seqs = telomere_seqs();
        for orientation in Orientation::iter() {
            let mut clip = seqs.array(orientation, MIN_TELO_ARRAY_SIZE);
            for unit in 0..MIN_TELO_ARRAY_SIZE {
                substitute(&mut clip, unit * seqs.unit_len() + 3);
            }
            assert!(has_array(&matcher(MIN_TELO_ARRAY_SIZE as u8), &clip, orientation));
        }
    }

    #[test]
    fn test_max_edit_distance_threshold_is_applied() {
        let seqs = telomere_seqs();
        let mut clip = seqs.array(Orientation::Forward, MIN_TELO_ARRAY_SIZE);
        substitute(&mut clip, 3);
        substitute(&mut clip, seqs.unit_len() + 3);

        assert!(has_array(&matcher(2), &clip, Orientation::Forward));
        assert!(has_array(&matcher(3), &clip, Orientation::Forward));
        assert!(!has_array(&matcher(1), &clip, Orientation::Forward));
        assert!(!has_array(&matcher(0), &clip, Orientation::Forward));
    }

    #[test]
    fn test_lowercase_softclips_are_recognised() {
        let clip = telomere_seqs()
            .array(Orientation::Forward, MIN_TELO_ARRAY_SIZE)
            .to_ascii_lowercase();
        assert!(has_array(&matcher(0), &clip, Orientation::Forward));
    }

    #[test]
    fn test_observation_without_clipped_bases() {
        let observation = SoftclipObservation::new(ALIGNED_SEQ, "read", 219, 19, 0);
        assert!(!matcher(3).has_softclipped_telo_array(&observation, Orientation::Forward));
        let observation = SoftclipObservation::new(ALIGNED_SEQ, "read", 199, -1, 0);
        assert!(!matcher(3).has_softclipped_telo_array(&observation, Orientation::Reverse));
    }

    #[test]
    fn test_telomere_seqs() {
        let seqs = telomere_seqs();
        assert_eq!(seqs.get(Orientation::Reverse), b"GCCTAA");
        assert_eq!(seqs.array(Orientation::Forward, 2), b"TTAGGCTTAGGC".to_vec());
        assert_eq!(matcher(0).array_len(), 18);
    }
}
