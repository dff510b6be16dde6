// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Scan regions, given as `contig:start-stop` strings or BED files, and
//! half-open genomic intervals.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::bed;

use crate::errors::{self, Error};

const REGION_DELIM1: char = ':';
const REGION_DELIM2: char = '-';

/// A region to scan: a whole contig, or a half-open `[start, end)` range of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct Region {
    pub contig: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl Region {
    pub fn whole_contig(contig: &str) -> Self {
        Region::new(contig.to_owned(), None, None)
    }

    pub fn bounded(contig: &str, start: u64, end: u64) -> Self {
        Region::new(contig.to_owned(), Some(start), Some(end))
    }

    /// Parse a region string of the form `contig:start-stop`.
    ///
    /// Thousands separators (`,`) in the coordinates are ignored. Exactly one
    /// `:` and one `-` are accepted and start has to be lower than stop.
    pub fn parse(region: &str) -> Result<Self> {
        let invalid = || Error::InvalidRegion {
            region: region.to_owned(),
        };

        let parts: Vec<&str> = region.split(REGION_DELIM1).collect();
        if parts.len() != 2 || parts[0].is_empty() {
            return Err(invalid().into());
        }
        let coords: Vec<&str> = parts[1].split(REGION_DELIM2).collect();
        if coords.len() != 2 {
            return Err(invalid().into());
        }
        let parse_coord = |coord: &str| coord.replace(',', "").parse::<u64>();
        let (start, end) = match (parse_coord(coords[0]), parse_coord(coords[1])) {
            (Ok(start), Ok(end)) if start < end => (start, end),
            _ => return Err(invalid().into()),
        };

        Ok(Region::bounded(parts[0], start, end))
    }

    /// Whether the half-open span `[start, end)` overlaps the region.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        let after_start = self.start.map_or(true, |region_start| end > region_start as i64);
        let before_end = self.end.map_or(true, |region_end| start < region_end as i64);
        start < end && after_start && before_end
    }

    /// A file name friendly identifier of the region.
    pub fn label(&self) -> String {
        let label = self.to_string();
        label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.start, self.end) {
            (Some(start), Some(end)) => write!(
                f,
                "{}{}{}{}{}",
                self.contig, REGION_DELIM1, start, REGION_DELIM2, end
            ),
            (Some(start), None) => write!(f, "{}{}{}", self.contig, REGION_DELIM1, start),
            _ => write!(f, "{}", self.contig),
        }
    }
}

/// Half-open genomic interval.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Interval {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Widen by `half_width` on both sides, clamping the start at 0 and the end
    /// at `contig_len` if given.
    pub fn widen(&self, half_width: u64, contig_len: Option<u64>) -> Interval {
        let end = self.end + half_width;
        Interval {
            contig: self.contig.clone(),
            start: self.start.saturating_sub(half_width),
            end: contig_len.map_or(end, |len| end.min(len)),
        }
    }

    pub fn to_region(&self) -> Region {
        Region::bounded(&self.contig, self.start, self.end)
    }
}

/// One whole contig region per contig, in the given order.
pub fn whole_genome(contigs: &[(String, u64)]) -> Vec<Region> {
    contigs
        .iter()
        .map(|(contig, _)| Region::whole_contig(contig))
        .collect()
}

/// Read all regions of a BED file, in file order.
pub fn regions_from_bed<P: AsRef<Path>>(path: P) -> Result<Vec<Region>> {
    let path = path.as_ref();
    info!("Reading regions from BED file: {}", path.display());

    let mut reader = bed::Reader::from_file(path).context("Failed to open BED file")?;
    let mut regions = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read BED record")?;
        if record.start() >= record.end() {
            return Err(errors::invalid_bed_record(
                record.chrom(),
                record.start() as i64,
                "Invalid region coordinates: start >= end",
            )
            .into());
        }
        regions.push(Region::bounded(
            record.chrom(),
            record.start(),
            record.end(),
        ));
    }

    if regions.is_empty() {
        return Err(Error::BedFileEmpty {
            path: path.to_path_buf(),
        }
        .into());
    }
    info!("    {} regions read", regions.len());

    Ok(regions)
}
