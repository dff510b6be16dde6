use std::path::Path;

use anyhow::{Context, Result};
use rust_htslib::bam;
use rust_htslib::bam::Read;

use crate::alignment::{AlignedRead, AlignmentSource, PileupColumn, ReadFilter};
use crate::errors::Error;
use crate::utils::regions::Region;

/// Indexed BAM/CRAM file, read through htslib.
pub struct IndexedBam {
    reader: bam::IndexedReader,
    contigs: Vec<(String, u64)>,
}

impl IndexedBam {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = bam::IndexedReader::from_path(path.as_ref()).with_context(|| {
            format!(
                "Failed to open indexed alignment file {}",
                path.as_ref().display()
            )
        })?;
        let header = reader.header();
        let contigs = header
            .target_names()
            .iter()
            .enumerate()
            .map(|(tid, name)| {
                (
                    String::from_utf8_lossy(name).into_owned(),
                    header.target_len(tid as u32).unwrap_or(0),
                )
            })
            .collect();

        Ok(IndexedBam { reader, contigs })
    }

    fn fetch(&mut self, region: &Region) -> Result<()> {
        if !self.contigs.iter().any(|(name, _)| *name == region.contig) {
            return Err(Error::UnknownAlignmentContig {
                contig: region.contig.clone(),
            }
            .into());
        }
        match (region.start, region.end) {
            (Some(start), Some(end)) => self
                .reader
                .fetch((region.contig.as_str(), start as i64, end as i64)),
            _ => self.reader.fetch(region.contig.as_str()),
        }
        .with_context(|| format!("Failed to fetch region {}", region))
    }
}

impl AlignmentSource for IndexedBam {
    fn contigs(&self) -> Vec<(String, u64)> {
        self.contigs.clone()
    }

    fn for_each_read<F>(&mut self, region: &Region, mut f: F) -> Result<()>
    where
        F: FnMut(AlignedRead) -> Result<()>,
    {
        self.fetch(region)?;
        let mut record = bam::Record::new();
        while let Some(result) = self.reader.read(&mut record) {
            result.with_context(|| format!("Failed to read alignment in {}", region))?;
            f(AlignedRead::from_record(&record, &region.contig))?;
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
        match columns {
            Some((first, last)) => self.fetch(&Region::bounded(
                &region.contig,
                first.max(0) as u64,
                (last + 1).max(0) as u64,
            ))?,
            None => self.fetch(region)?,
        }
        let mut pileups = self.reader.pileup();
        // htslib caps pileup depth at 8000 by default
        pileups.set_max_depth(i32::MAX as u32);

        for pileup in pileups {
            let pileup = pileup.with_context(|| format!("Failed to pile up reads in {}", region))?;
            let pos = pileup.pos() as i64;
            if pos < first || pos > last {
                continue;
            }
            let mut covered = false;
            let mut depth = 0;
            let mut heads = Vec::new();
            for alignment in pileup.alignments() {
                let record = alignment.record();
                if !region.overlaps(record.pos(), record.cigar().end_pos()) {
                    continue;
                }
                covered = true;
                if filter.passes_record(&record) {
                    depth += 1;
                }
                if alignment.is_head() {
                    heads.push(AlignedRead::from_record(&record, &region.contig));
                }
            }
            if covered {
                f(PileupColumn::new(pos, depth, heads))?;
            }
        }
        Ok(())
    }
}
