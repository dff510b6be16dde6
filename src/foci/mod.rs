// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Breakpoint foci: per-position soft-clip evidence collected from aligned reads.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use bio_types::strand::Strand;
use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

pub mod ledger;
pub mod orchestrator;
pub mod scanner;
pub mod softclips;
pub mod telomeres;

/// Side of the alignment on which a breakpoint soft-clip lies.
///
/// Forward: the soft-clip trails the alignment (3'), reverse: it precedes it (5').
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn strand(self) -> Strand {
        match self {
            Orientation::Forward => Strand::Forward,
            Orientation::Reverse => Strand::Reverse,
        }
    }
}

/// Breakpoint polarity.
///
/// * `S2G` (soma-to-germline): telomere-containing soft-clips aligned to a
///   non-telomeric genome region.
/// * `G2S` (germline-to-soma): non-telomeric soft-clips aligned to a
///   telomere-containing genome region.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
)]
pub enum BreakpointType {
    S2G,
    G2S,
}

/// Aggregated evidence at a single reference position (a "focus").
///
/// Records are keyed by `(contig, start)`; `end` is `start + 1` for records
/// produced by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointRecord {
    pub contig: String,
    pub start: i64,
    pub end: i64,
    pub read_depth: u32,
    pub breakpoint_type: Option<BreakpointType>,
    pub softclips_forward: u32,
    pub softclips_reverse: u32,
}

impl BreakpointRecord {
    /// A point record at `pos` without any evidence.
    pub fn at(contig: &str, pos: i64, breakpoint_type: Option<BreakpointType>) -> Self {
        BreakpointRecord {
            contig: contig.to_owned(),
            start: pos,
            end: pos + 1,
            read_depth: 0,
            breakpoint_type,
            softclips_forward: 0,
            softclips_reverse: 0,
        }
    }

    pub fn support(&self, orientation: Orientation) -> u32 {
        match orientation {
            Orientation::Forward => self.softclips_forward,
            Orientation::Reverse => self.softclips_reverse,
        }
    }

    pub fn support_mut(&mut self, orientation: Orientation) -> &mut u32 {
        match orientation {
            Orientation::Forward => &mut self.softclips_forward,
            Orientation::Reverse => &mut self.softclips_reverse,
        }
    }

    pub fn total_support(&self) -> u32 {
        self.softclips_forward + self.softclips_reverse
    }
}

/// Column names of a foci table, in serialization order.
pub const FOCI_COLUMNS: [&str; 7] = [
    "contig",
    "start",
    "end",
    "read_depth",
    "breakpoint_type",
    "softclips_forward",
    "softclips_reverse",
];

pub fn foci_writer<W: io::Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer)
}

/// Parse a merged tab-separated foci table.
pub fn read_foci<P: AsRef<Path>>(path: P) -> Result<Vec<BreakpointRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path.as_ref())
        .with_context(|| format!("Failed to open foci table {}", path.as_ref().display()))?;
    let mut foci = Vec::new();
    for record in reader.deserialize() {
        foci.push(record.context("Failed to parse foci table record")?);
    }
    Ok(foci)
}
