// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! BED outputs: ranked breakpoint locations and located telomere arrays.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde_derive::Serialize;

use crate::clustering::MaximalFocus;
use crate::utils::regions::Interval;

const TELOMERE_ARRAY_NAME: &str = "telomere_array";

#[derive(Debug, Serialize)]
struct BreakpointLocation<'a> {
    contig: &'a str,
    start: i64,
    end: i64,
    name: String,
    score: u32,
    strand: &'a str,
}

#[derive(Debug, Serialize)]
struct NamedInterval<'a> {
    contig: &'a str,
    start: u64,
    end: u64,
    name: &'a str,
}

fn bed_writer(path: &Path) -> Result<csv::Writer<File>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create BED file {}", path.display()))
}

/// BED name field carrying the provenance of a maximal focus.
pub fn breakpoint_name(maximal_focus: &MaximalFocus) -> String {
    let breakpoint_type = maximal_focus
        .breakpoint_type
        .map_or_else(|| "unset".to_owned(), |breakpoint_type| breakpoint_type.to_string());
    format!(
        "breakpoint_type={};next_max_value={};max_value_other_orientation={};window={}-{};read_depth={}",
        breakpoint_type,
        maximal_focus.next_max_value,
        maximal_focus.max_value_other_orientation,
        maximal_focus.interval.0,
        maximal_focus.interval.1,
        maximal_focus.focus.read_depth
    )
}

/// Write maximal foci in the given order, scored by their support.
pub fn write_breakpoint_locations<P: AsRef<Path>>(
    maximal_foci: &[MaximalFocus],
    path: P,
) -> Result<()> {
    let mut writer = bed_writer(path.as_ref())?;
    for maximal_focus in maximal_foci {
        let strand = maximal_focus.orientation.strand();
        writer.serialize(BreakpointLocation {
            contig: maximal_focus.contig(),
            start: maximal_focus.focus.start,
            end: maximal_focus.focus.end,
            name: breakpoint_name(maximal_focus),
            score: maximal_focus.max_value,
            strand: strand.strand_symbol(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_telomere_arrays<P: AsRef<Path>>(arrays: &[Interval], path: P) -> Result<()> {
    let mut writer = bed_writer(path.as_ref())?;
    for array in arrays {
        writer.serialize(NamedInterval {
            contig: &array.contig,
            start: array.start,
            end: array.end,
            name: TELOMERE_ARRAY_NAME,
        })?;
    }
    writer.flush()?;
    Ok(())
}
