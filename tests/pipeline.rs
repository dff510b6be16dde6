use std::fs;

use bio::alphabets::dna::revcomp;
use bio::io::fasta;
use rust_htslib::bam::record::Cigar;

use telobreak::alignment::{AlignedRead, InMemoryAlignments};
use telobreak::calling::{find_breakpoints, DetectionParams, DetectionParamsBuilder};
use telobreak::constants::*;
use telobreak::foci::scanner::ScanStrategy;
use telobreak::foci::{read_foci, BreakpointType, Orientation};
use telobreak::reference::{InMemoryReference, ReferenceSource};
use telobreak::utils::regions::whole_genome;

const TELOMERE: &[u8] = b"TTAGGC";

fn filler(len: usize) -> Vec<u8> {
    b"ACGTTGCA".iter().cycle().take(len).cloned().collect()
}

/// chr1 carries no telomere, chr2 an array of five units at [100, 130).
fn reference() -> InMemoryReference {
    let mut chr2 = filler(100);
    chr2.extend(TELOMERE.repeat(5));
    chr2.extend(filler(100));
    InMemoryReference::new(vec![
        ("chr1".to_owned(), filler(400)),
        ("chr2".to_owned(), chr2),
    ])
}

fn trailing_clip_read(name: &str, contig: &str, start: i64, len: usize, clip: &[u8]) -> AlignedRead {
    let mut seq = filler(len);
    seq.extend(clip);
    AlignedRead::new(
        name,
        contig,
        start,
        vec![Cigar::Match(len as u32), Cigar::SoftClip(clip.len() as u32)],
        &seq,
    )
}

fn leading_clip_read(name: &str, contig: &str, start: i64, len: usize, clip: &[u8]) -> AlignedRead {
    let mut seq = clip.to_vec();
    seq.extend(filler(len));
    AlignedRead::new(
        name,
        contig,
        start,
        vec![Cigar::SoftClip(clip.len() as u32), Cigar::Match(len as u32)],
        &seq,
    )
}

fn alignments() -> InMemoryAlignments {
    let telomeric_clip = TELOMERE.repeat(3);
    let mut reads = Vec::new();
    // S2G breakpoint on chr1 at 200, with a weaker neighbour at 203
    for i in 0..4 {
        reads.push(trailing_clip_read(&format!("s2g{}", i), "chr1", 180, 20, &telomeric_clip));
    }
    reads.push(trailing_clip_read("s2g_near", "chr1", 183, 20, &telomeric_clip));
    reads.push(AlignedRead::new(
        "spanning",
        "chr1",
        150,
        vec![Cigar::Match(100)],
        &filler(100),
    ));
    // telomeric soft-clips inside the reference telomere array of chr2
    for i in 0..3 {
        reads.push(trailing_clip_read(&format!("in_array{}", i), "chr2", 95, 15, &telomeric_clip));
    }
    // G2S breakpoint right after the chr2 telomere array
    for i in 0..3 {
        reads.push(leading_clip_read(&format!("g2s{}", i), "chr2", 130, 20, &filler(20)));
    }
    // filtered out
    reads.push(trailing_clip_read("dup", "chr1", 180, 20, &telomeric_clip).with_flags(1024));
    reads.push(trailing_clip_read("low_mapq", "chr1", 180, 20, &telomeric_clip).with_mapq(3));

    InMemoryAlignments::new(vec![("chr1".to_owned(), 400), ("chr2".to_owned(), 230)], reads)
}

fn params(strategy: ScanStrategy) -> DetectionParams {
    DetectionParamsBuilder::default()
        .telo_array_size(3)
        .telo_max_edit_distance(0)
        .cov_window_size(2)
        .min_supporting_reads(3)
        .seq_window_size(10)
        .strategy(strategy)
        .threads(2)
        .build()
        .unwrap()
}

#[test]
fn test_find_breakpoints() {
    let reference = reference();
    let alignments = alignments();
    let regions = whole_genome(&reference.contigs());
    let mut foci_per_strategy = Vec::new();

    for strategy in [ScanStrategy::Streaming, ScanStrategy::TwoPass].iter() {
        let outdir = tempfile::tempdir().unwrap();
        let breakpoints = find_breakpoints(
            || Ok(alignments.clone()),
            &reference,
            &regions,
            &params(*strategy),
            outdir.path(),
        )
        .unwrap();

        let found: Vec<_> = breakpoints
            .iter()
            .map(|breakpoint| {
                (
                    breakpoint.contig().to_owned(),
                    breakpoint.position(),
                    breakpoint.orientation,
                    breakpoint.breakpoint_type,
                    breakpoint.max_value,
                )
            })
            .collect();
        assert_eq!(
            found,
            vec![
                (
                    "chr1".to_owned(),
                    200,
                    Orientation::Forward,
                    Some(BreakpointType::S2G),
                    4
                ),
                (
                    "chr2".to_owned(),
                    129,
                    Orientation::Reverse,
                    Some(BreakpointType::G2S),
                    3
                ),
            ]
        );

        // merged foci of both breakpoint types, including the ones later
        // discarded as lying in a telomere array
        let foci = read_foci(outdir.path().join(FOCI_FILENAME)).unwrap();
        assert!(foci
            .iter()
            .any(|focus| focus.contig == "chr2" && focus.start == 110 && focus.softclips_forward == 3));
        assert!(foci
            .iter()
            .any(|focus| focus.breakpoint_type == Some(BreakpointType::G2S)));
        foci_per_strategy.push(foci);

        let locations =
            fs::read_to_string(outdir.path().join(BREAKPOINT_LOCATIONS_FILENAME)).unwrap();
        assert_eq!(
            locations,
            "chr1\t200\t201\tbreakpoint_type=S2G;next_max_value=1;max_value_other_orientation=0;window=200-204;read_depth=2\t4\t+\n\
             chr2\t129\t130\tbreakpoint_type=G2S;next_max_value=0;max_value_other_orientation=0;window=129-130;read_depth=0\t3\t-\n"
        );

        let records: Vec<_> = fasta::Reader::from_file(outdir.path().join(BREAKPOINT_SEQUENCES_FILENAME))
            .unwrap()
            .records()
            .map(|record| record.unwrap())
            .collect();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].id(), "S2G__+__chr1__200");
        let mut expected = reference.fetch("chr1", 190, 200).unwrap();
        expected.push(b'N');
        expected.extend(reference.fetch("chr1", 200, 210).unwrap());
        assert_eq!(records[0].seq(), &expected[..]);

        assert_eq!(records[1].id(), "G2S__-__chr2__129");
        assert_eq!(
            records[1].desc(),
            Some("max_value=3;next_max_value=0;max_value_other_orientation=0")
        );
        let mut expected = reference.fetch("chr2", 119, 129).unwrap();
        expected.push(b'N');
        expected.extend(reference.fetch("chr2", 129, 139).unwrap());
        assert_eq!(records[1].seq(), &revcomp(&expected)[..]);
    }

    // G2S scans run on bounded regions around the located arrays
    assert_eq!(foci_per_strategy[0], foci_per_strategy[1]);
}

#[test]
fn test_find_breakpoints_single_type() {
    let reference = reference();
    let alignments = alignments();
    let outdir = tempfile::tempdir().unwrap();
    let mut params = DetectionParamsBuilder::default();
    params
        .telo_array_size(3)
        .telo_max_edit_distance(0)
        .cov_window_size(2)
        .min_supporting_reads(3)
        .breakpoint_types(vec![BreakpointType::G2S]);

    let breakpoints = find_breakpoints(
        || Ok(alignments.clone()),
        &reference,
        &whole_genome(&reference.contigs()),
        &params.build().unwrap(),
        outdir.path(),
    )
    .unwrap();
    assert_eq!(breakpoints.len(), 1);
    assert_eq!(breakpoints[0].position(), 129);

    let foci = read_foci(outdir.path().join(FOCI_FILENAME)).unwrap();
    assert!(foci
        .iter()
        .all(|focus| focus.breakpoint_type == Some(BreakpointType::G2S)));
}

#[test]
fn test_find_breakpoints_without_evidence() {
    let reference = reference();
    let alignments = InMemoryAlignments::new(
        vec![("chr1".to_owned(), 400), ("chr2".to_owned(), 230)],
        vec![AlignedRead::new(
            "plain",
            "chr1",
            10,
            vec![Cigar::Match(50)],
            &filler(50),
        )],
    );
    let outdir = tempfile::tempdir().unwrap();
    let breakpoints = find_breakpoints(
        || Ok(alignments.clone()),
        &reference,
        &whole_genome(&reference.contigs()),
        &params(ScanStrategy::Streaming),
        outdir.path(),
    )
    .unwrap();
    assert!(breakpoints.is_empty());
    assert!(read_foci(outdir.path().join(FOCI_FILENAME)).unwrap().is_empty());
    assert_eq!(
        fs::read_to_string(outdir.path().join(BREAKPOINT_LOCATIONS_FILENAME)).unwrap(),
        ""
    );
    assert_eq!(
        fs::read_to_string(outdir.path().join(BREAKPOINT_SEQUENCES_FILENAME)).unwrap(),
        ""
    );
}

#[test]
fn test_invalid_params_fail_before_scanning() {
    let reference = reference();
    let outdir = tempfile::tempdir().unwrap();
    let params = DetectionParamsBuilder::default()
        .cov_window_size(0)
        .build()
        .unwrap();
    let result = find_breakpoints(
        || -> anyhow::Result<InMemoryAlignments> { panic!("no scan expected") },
        &reference,
        &whole_genome(&reference.contigs()),
        &params,
        outdir.path(),
    );
    assert!(result.is_err());
}
