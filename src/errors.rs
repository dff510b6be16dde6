// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("invalid region '{region}'; use CONTIG:START-STOP syntax with START < STOP")]
    InvalidRegion { region: String },
    #[error("invalid BED record at {chrom}:{pos}: {msg}")]
    InvalidBedRecord {
        chrom: String,
        pos: i64,
        msg: String,
    },
    #[error("BED file {path} does not contain any region")]
    BedFileEmpty { path: PathBuf },
    #[error("contig {contig} not found in the alignment header")]
    UnknownAlignmentContig { contig: String },
    #[error("contig {contig} not found in the reference")]
    UnknownReferenceContig { contig: String },
    #[error("invalid telomere sequence '{seq}': must be a non-empty sequence of A, C, G and T")]
    InvalidTelomereSequence { seq: String },
    #[error("telomere array of {len} bases exceeds the maximum supported length of {max} bases; lower --telo-array-size")]
    TelomereArrayTooLong { len: usize, max: usize },
    #[error("--telo-array-size must be at least 1")]
    InvalidTeloArraySize,
    #[error("--cov-window-size must be at least 1, got {value}")]
    InvalidCoverageWindow { value: i64 },
    #[error("--telo-max-edit-distance of {value} is too large; it must not exceed {max}")]
    InvalidMaxEditDistance { value: u32, max: u32 },
    #[error("at least one breakpoint type has to be requested")]
    NoBreakpointTypes,
}

pub(crate) fn invalid_bed_record(chrom: &str, pos: i64, msg: &str) -> Error {
    Error::InvalidBedRecord {
        chrom: chrom.to_owned(),
        pos,
        msg: msg.to_owned(),
    }
}
