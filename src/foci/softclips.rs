use rust_htslib::bam::record::Cigar;

use crate::alignment::AlignedRead;
use crate::foci::Orientation;

/// A soft-clip at one extremity of a read.
///
/// `reference_position` and `query_position` point at the soft-clipped base
/// adjacent to the alignment: for forward orientation the first base past the
/// last aligned base, for reverse orientation the base right before the first
/// aligned base.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SoftclipObservation<'a> {
    pub sequence: &'a [u8],
    pub read_name: &'a str,
    pub reference_position: i64,
    pub query_position: i64,
    pub clip_len: usize,
}

/// Locate the soft-clip at the requested extremity of a read.
///
/// Returns `None` if the outermost CIGAR operation on that side is not a
/// soft-clip, or if the read has no CIGAR or no sequence.
pub fn find_softclip_at_extremity(
    read: &AlignedRead,
    orientation: Orientation,
) -> Option<SoftclipObservation> {
    if read.sequence.is_empty() {
        return None;
    }
    match orientation {
        Orientation::Forward => match read.cigar.last() {
            Some(Cigar::SoftClip(len)) => Some(SoftclipObservation::new(
                &read.sequence,
                &read.name,
                read.reference_end,
                read.query_alignment_end as i64,
                *len as usize,
            )),
            _ => None,
        },
        Orientation::Reverse => match read.cigar.first() {
            Some(Cigar::SoftClip(len)) => Some(SoftclipObservation::new(
                &read.sequence,
                &read.name,
                read.reference_start - 1,
                read.query_alignment_start as i64 - 1,
                *len as usize,
            )),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NEMATODA_TELOMERE_FORWARD;

    const ALIGNED_SEQ: &[u8] = b"ATGCAAAAAAAAATTTGGA";

    fn added_softclips() -> Vec<u8> {
        NEMATODA_TELOMERE_FORWARD.as_bytes().repeat(3)
    }

    fn basic_read() -> AlignedRead {
        AlignedRead::new(
            "test_query",
            "chr1",
            200,
            vec![Cigar::Match(ALIGNED_SEQ.len() as u32)],
            ALIGNED_SEQ,
        )
    }

    fn read_with_3prime_softclips() -> AlignedRead {
        let clip = added_softclips();
        let mut seq = ALIGNED_SEQ.to_vec();
        seq.extend(&clip);
        AlignedRead::new(
            "test_query",
            "chr1",
            200,
            vec![
                Cigar::Match(ALIGNED_SEQ.len() as u32),
                Cigar::SoftClip(clip.len() as u32),
            ],
            &seq,
        )
    }

    fn read_with_5prime_softclips() -> AlignedRead {
        let mut seq = added_softclips();
        let clip_len = seq.len();
        seq.extend(ALIGNED_SEQ);
        AlignedRead::new(
            "test_query",
            "chr1",
            200,
            vec![
                Cigar::SoftClip(clip_len as u32),
                Cigar::Match(ALIGNED_SEQ.len() as u32),
            ],
            &seq,
        )
    }

    #[test]
    fn test_read_no_softclips() {
        let read = basic_read();
        assert_eq!(find_softclip_at_extremity(&read, Orientation::Forward), None);
        assert_eq!(find_softclip_at_extremity(&read, Orientation::Reverse), None);
    }

    #[test]
    fn test_read_with_3prime_softclips() {
        let read = read_with_3prime_softclips();
        let observation = find_softclip_at_extremity(&read, Orientation::Forward).unwrap();
        assert_eq!(
            observation,
            SoftclipObservation::new(
                &read.sequence,
                "test_query",
                200 + ALIGNED_SEQ.len() as i64,
                ALIGNED_SEQ.len() as i64,
                18,
            )
        );
        assert_eq!(find_softclip_at_extremity(&read, Orientation::Reverse), None);
    }

    #[test]
    fn test_read_with_5prime_softclips() {
        let read = read_with_5prime_softclips();
        let observation = find_softclip_at_extremity(&read, Orientation::Reverse).unwrap();
        assert_eq!(observation.reference_position, 199);
        assert_eq!(observation.query_position, added_softclips().len() as i64 - 1);
        assert_eq!(observation.clip_len, 18);
        assert_eq!(find_softclip_at_extremity(&read, Orientation::Forward), None);
    }

    #[test]
    fn test_hardclip_outside_softclip_is_not_an_extremity_softclip() {
        let mut read = read_with_3prime_softclips();
        read.cigar.push(Cigar::HardClip(5));
        assert_eq!(find_softclip_at_extremity(&read, Orientation::Forward), None);
    }

    #[test]
    fn test_malformed_reads_yield_no_observation() {
        let mut no_cigar = read_with_3prime_softclips();
        no_cigar.cigar.clear();
        assert_eq!(find_softclip_at_extremity(&no_cigar, Orientation::Forward), None);
        assert_eq!(find_softclip_at_extremity(&no_cigar, Orientation::Reverse), None);

        let mut no_sequence = read_with_5prime_softclips();
        no_sequence.sequence.clear();
        assert_eq!(find_softclip_at_extremity(&no_sequence, Orientation::Reverse), None);
    }
}
