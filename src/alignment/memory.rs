use anyhow::Result;

use crate::alignment::{AlignedRead, AlignmentSource, PileupColumn, ReadFilter};
use crate::errors::Error;
use crate::utils::regions::Region;

/// Alignment source backed by a vector of reads.
///
/// Reads without any reference-consuming operation are ignored, as htslib
/// would not place them in a pileup either.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAlignments {
    contigs: Vec<(String, u64)>,
    reads: Vec<AlignedRead>,
}

impl InMemoryAlignments {
    pub fn new(contigs: Vec<(String, u64)>, mut reads: Vec<AlignedRead>) -> Self {
        let rank = |contig: &str| contigs.iter().position(|(name, _)| name == contig);
        reads.sort_by_key(|read| (rank(&read.contig), read.reference_start));
        InMemoryAlignments { contigs, reads }
    }

    fn overlapping<'a>(&'a self, region: &'a Region) -> Result<Vec<&'a AlignedRead>> {
        if !self.contigs.iter().any(|(name, _)| *name == region.contig) {
            return Err(Error::UnknownAlignmentContig {
                contig: region.contig.clone(),
            }
            .into());
        }
        Ok(self
            .reads
            .iter()
            .filter(|read| {
                read.contig == region.contig
                    && region.overlaps(read.reference_start, read.reference_end)
            })
            .collect())
    }
}

impl AlignmentSource for InMemoryAlignments {
    fn contigs(&self) -> Vec<(String, u64)> {
        self.contigs.clone()
    }

    fn for_each_read<F>(&mut self, region: &Region, mut f: F) -> Result<()>
    where
        F: FnMut(AlignedRead) -> Result<()>,
    {
        for read in self.overlapping(region)? {
            f(read.clone())?;
        }
        Ok(())
    }

    fn for_each_column<F>(
        &mut self,
        region: &Region,
        columns: Option<(i64, i64)>,
        filter: &ReadFilter,
        mut f: F,
    ) -> Result<()>
    where
        F: FnMut(PileupColumn) -> Result<()>,
    {
        let (first, last) = columns.unwrap_or((i64::MIN, i64::MAX));
        let reads: Vec<_> = self
            .overlapping(region)?
            .into_iter()
            .filter(|read| read.reference_end > first && read.reference_start <= last)
            .collect();
        let mut active: Vec<&AlignedRead> = Vec::new();
        let mut next = 0;
        let mut pos = match reads.first() {
            Some(read) => read.reference_start.max(first),
            None => return Ok(()),
        };

        while pos <= last {
            active.retain(|read| read.reference_end > pos);
            let mut heads = Vec::new();
            while next < reads.len() && reads[next].reference_start <= pos {
                active.push(reads[next]);
                if reads[next].reference_start == pos {
                    heads.push(reads[next].clone());
                }
                next += 1;
            }
            if active.is_empty() {
                if next == reads.len() {
                    break;
                }
                pos = reads[next].reference_start;
                continue;
            }
            let depth = active.iter().filter(|read| filter.passes(read)).count() as u32;
            f(PileupColumn::new(pos, depth, heads))?;
            pos += 1;
        }
        Ok(())
    }
}
