//! Alignment sources: the row (read) and column (pileup) views a region scan
//! is driven by.

use anyhow::Result;
use rust_htslib::bam;
use rust_htslib::bam::record::Cigar;

use crate::utils::regions::Region;

pub mod htslib;
pub mod memory;

pub use self::htslib::IndexedBam;
pub use self::memory::InMemoryAlignments;

/// An aligned read, reduced to what breakpoint detection needs.
///
/// Coordinates are 0-based. `reference_end` and `query_alignment_end` are
/// exclusive, `query_alignment_start`/`query_alignment_end` index into
/// `sequence` and exclude soft-clipped bases.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRead {
    pub name: String,
    pub contig: String,
    pub flags: u16,
    pub mapq: u8,
    pub cigar: Vec<Cigar>,
    pub reference_start: i64,
    pub reference_end: i64,
    pub query_alignment_start: usize,
    pub query_alignment_end: usize,
    pub sequence: Vec<u8>,
}

impl AlignedRead {
    /// Build a mapped read from its alignment start, CIGAR and sequence.
    /// Flags default to 0 and mapping quality to 60.
    pub fn new(name: &str, contig: &str, reference_start: i64, cigar: Vec<Cigar>, sequence: &[u8]) -> Self {
        let reference_len: i64 = cigar
            .iter()
            .map(|op| match op {
                Cigar::Match(l) | Cigar::Del(l) | Cigar::RefSkip(l) | Cigar::Equal(l) | Cigar::Diff(l) => {
                    *l as i64
                }
                _ => 0,
            })
            .sum();
        let leading_softclips = softclip_len(cigar.iter());
        let trailing_softclips = softclip_len(cigar.iter().rev());

        AlignedRead {
            name: name.to_owned(),
            contig: contig.to_owned(),
            flags: 0,
            mapq: 60,
            reference_start,
            reference_end: reference_start + reference_len,
            query_alignment_start: leading_softclips,
            query_alignment_end: sequence.len().saturating_sub(trailing_softclips),
            cigar,
            sequence: sequence.to_vec(),
        }
    }

    pub fn with_mapq(mut self, mapq: u8) -> Self {
        self.mapq = mapq;
        self
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn from_record(record: &bam::Record, contig: &str) -> Self {
        let cigar: Vec<Cigar> = record.cigar().iter().cloned().collect();
        AlignedRead::new(
            &String::from_utf8_lossy(record.qname()),
            contig,
            record.pos(),
            cigar,
            &record.seq().as_bytes(),
        )
        .with_mapq(record.mapq())
        .with_flags(record.flags())
    }
}

/// Soft-clipped bases at the outer end of the given (possibly reversed) CIGAR,
/// looking through hard clips.
fn softclip_len<'a, I: Iterator<Item = &'a Cigar>>(ops: I) -> usize {
    ops.skip_while(|op| matches!(op, Cigar::HardClip(_)))
        .take_while(|op| matches!(op, Cigar::SoftClip(_)))
        .map(|op| op.len() as usize)
        .sum()
}

/// Read-level filter: minimum mapping quality and a bitwise exclusion flag.
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct ReadFilter {
    pub min_mapq: u8,
    pub exclude_flags: u16,
}

impl ReadFilter {
    pub fn passes(&self, read: &AlignedRead) -> bool {
        read.mapq >= self.min_mapq && read.flags & self.exclude_flags == 0
    }

    pub fn passes_record(&self, record: &bam::Record) -> bool {
        record.mapq() >= self.min_mapq && record.flags() & self.exclude_flags == 0
    }
}

/// One pileup column.
///
/// `depth` counts the reads covering `pos` that pass the column filter;
/// `heads` holds every read whose first aligned base is at `pos`.
#[derive(Debug, Clone, new)]
pub struct PileupColumn {
    pub pos: i64,
    pub depth: u32,
    pub heads: Vec<AlignedRead>,
}

pub trait AlignmentSource {
    /// Contig names and lengths in header order.
    fn contigs(&self) -> Vec<(String, u64)>;

    /// Visit all reads overlapping the region, in coordinate order.
    fn for_each_read<F>(&mut self, region: &Region, f: F) -> Result<()>
    where
        F: FnMut(AlignedRead) -> Result<()>;

    /// Visit the pileup columns of all reads overlapping the region, in
    /// increasing position order.
    ///
    /// Only reads overlapping `region` are piled up, including their bases
    /// outside of it. With `columns` given as an inclusive `(first, last)`
    /// range, only the columns inside that range are visited.
    fn for_each_column<F>(
        &mut self,
        region: &Region,
        columns: Option<(i64, i64)>,
        filter: &ReadFilter,
        f: F,
    ) -> Result<()>
    where
        F: FnMut(PileupColumn) -> Result<()>;
}
