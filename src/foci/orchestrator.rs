// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Parallel fan-out of region scans and deterministic merging of their
//! per-region foci tables.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::alignment::AlignmentSource;
use crate::foci::scanner::{RegionScanner, ScanStats};
use crate::foci::{foci_writer, FOCI_COLUMNS};
use crate::utils::regions::Region;

/// Scan all regions on a pool of `threads` workers.
///
/// Every worker opens its own alignment source with `open_source` and writes
/// its foci into a temporary table in `workdir`. The tables are returned in
/// region order; they are removed once dropped.
pub fn scan_regions<A, O>(
    open_source: O,
    scanner: &RegionScanner,
    regions: &[Region],
    workdir: &Path,
    threads: usize,
) -> Result<Vec<NamedTempFile>>
where
    A: AlignmentSource,
    O: Fn() -> Result<A> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to set up worker pool")?;

    let scanned: Vec<(NamedTempFile, ScanStats)> = pool.install(|| {
        regions
            .par_iter()
            .map(|region| scan_region(&open_source, scanner, region, workdir))
            .collect::<Result<_>>()
    })?;

    let (committed, peak_open) = scanned.iter().fold((0, 0), |(committed, peak), (_, stats)| {
        (committed + stats.committed, peak.max(stats.peak_open))
    });
    info!(
        "Scanned {} regions: {} foci committed, at most {} open foci in a single region",
        regions.len(),
        committed,
        peak_open
    );

    Ok(scanned.into_iter().map(|(table, _)| table).collect())
}

fn scan_region<A, O>(
    open_source: &O,
    scanner: &RegionScanner,
    region: &Region,
    workdir: &Path,
) -> Result<(NamedTempFile, ScanStats)>
where
    A: AlignmentSource,
    O: Fn() -> Result<A>,
{
    debug!("Scanning region {}", region);
    let mut source = open_source()?;
    let table = tempfile::Builder::new()
        .prefix(&format!("{}.", region.label()))
        .suffix(".tsv")
        .tempfile_in(workdir)
        .with_context(|| {
            format!(
                "Failed to create foci table for region {} in {}",
                region,
                workdir.display()
            )
        })?;

    let stats = {
        let mut writer = foci_writer(BufWriter::new(table.as_file()));
        let stats = scanner
            .scan(&mut source, region, |record| {
                writer.serialize(&record)?;
                Ok(())
            })
            .with_context(|| format!("Failed to scan region {}", region))?;
        writer.flush()?;
        stats
    };

    Ok((table, stats))
}

/// Concatenate foci tables in the given order.
///
/// The header line is kept once, blank lines are skipped. Returns the number
/// of records written.
pub fn merge_foci_tables<P: AsRef<Path>>(tables: &[P], merged: &Path) -> Result<usize> {
    let mut writer = BufWriter::new(
        File::create(merged)
            .with_context(|| format!("Failed to create foci table {}", merged.display()))?,
    );
    let mut header_written = false;
    let mut records = 0;

    for table in tables {
        let table = table.as_ref();
        let reader = BufReader::new(
            File::open(table)
                .with_context(|| format!("Failed to open foci table {}", table.display()))?,
        );
        let mut in_header = true;
        for line in reader.lines() {
            let line = line.with_context(|| format!("Failed to read {}", table.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            if in_header {
                in_header = false;
                if header_written {
                    continue;
                }
                header_written = true;
            } else {
                records += 1;
            }
            writeln!(writer, "{}", line)?;
        }
    }
    if !header_written {
        writeln!(writer, "{}", FOCI_COLUMNS.join("\t"))?;
    }
    writer.flush()?;

    debug!(
        "Merged {} foci tables into {}",
        tables.len(),
        merged.display()
    );
    Ok(records)
}
