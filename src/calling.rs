// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The breakpoint detection pipeline: scan, merge, cluster, filter, extract.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use derive_builder::Builder;
use itertools::Itertools;

use crate::alignment::{AlignmentSource, ReadFilter};
use crate::breakpoint_sequences::{extract_breakpoint_sequences, write_breakpoint_sequences};
use crate::clustering::{cluster_breakpoint_foci, select_maximal_foci, MaximalFocus};
use crate::constants::*;
use crate::errors::Error;
use crate::foci::orchestrator::{merge_foci_tables, scan_regions};
use crate::foci::scanner::{RegionScanner, ScanStrategy};
use crate::foci::telomeres::{TelomereArrayMatcher, TelomereSeqs};
use crate::foci::{read_foci, BreakpointType};
use crate::output::write_breakpoint_locations;
use crate::reference::ReferenceSource;
use crate::telomere_arrays::{remove_breakpoints_in_telomere_arrays, TelomereArrayLocator};
use crate::utils::is_dna;
use crate::utils::regions::Region;

/// Configuration of a breakpoint detection run.
#[derive(Debug, Clone, PartialEq, Builder, Getters)]
#[getset(get = "pub")]
pub struct DetectionParams {
    #[builder(default = "NEMATODA_TELOMERE_FORWARD.to_owned()", setter(into))]
    telomere_forward_seq: String,
    /// Minimum number of tandem telomere units in a soft-clip.
    #[builder(default = "DEFAULT_TELO_ARRAY_SIZE")]
    telo_array_size: usize,
    #[builder(default = "DEFAULT_TELO_MAX_EDIT_DISTANCE")]
    telo_max_edit_distance: u32,
    #[builder(default = "DEFAULT_TELO_ARRAY_WINDOW")]
    telo_array_window: u64,
    #[builder(default = "DEFAULT_COV_WINDOW_SIZE")]
    cov_window_size: i64,
    #[builder(default = "DEFAULT_MIN_MAPQ")]
    min_mapq: u8,
    #[builder(default = "DEFAULT_READ_FILTER_FLAG")]
    read_filter_flag: u16,
    #[builder(default = "DEFAULT_CLUSTERING_THRESHOLD")]
    clustering_threshold: u64,
    #[builder(default = "DEFAULT_MIN_SUPPORTING_READS")]
    min_supporting_reads: u32,
    #[builder(default = "DEFAULT_SEQ_WINDOW_SIZE")]
    seq_window_size: u64,
    #[builder(default = "vec![BreakpointType::S2G, BreakpointType::G2S]")]
    breakpoint_types: Vec<BreakpointType>,
    #[builder(default)]
    strategy: ScanStrategy,
    #[builder(default = "1")]
    threads: usize,
}

impl DetectionParams {
    pub fn validate(&self) -> Result<()> {
        if !is_dna(self.telomere_forward_seq.as_bytes()) {
            return Err(Error::InvalidTelomereSequence {
                seq: self.telomere_forward_seq.clone(),
            }
            .into());
        }
        if self.telo_array_size < 1 {
            return Err(Error::InvalidTeloArraySize.into());
        }
        let array_len = self.telomere_forward_seq.len() * self.telo_array_size;
        if array_len > MAX_TELOMERE_ARRAY_LEN {
            return Err(Error::TelomereArrayTooLong {
                len: array_len,
                max: MAX_TELOMERE_ARRAY_LEN,
            }
            .into());
        }
        if self.telo_max_edit_distance as usize > array_len {
            return Err(Error::InvalidMaxEditDistance {
                value: self.telo_max_edit_distance,
                max: array_len as u32,
            }
            .into());
        }
        if self.cov_window_size < 1 {
            return Err(Error::InvalidCoverageWindow {
                value: self.cov_window_size,
            }
            .into());
        }
        if self.breakpoint_types.is_empty() {
            return Err(Error::NoBreakpointTypes.into());
        }
        Ok(())
    }

    pub fn telomere_seqs(&self) -> TelomereSeqs {
        TelomereSeqs::from_forward(self.telomere_forward_seq.as_bytes())
    }

    pub fn read_filter(&self) -> ReadFilter {
        ReadFilter::new(self.min_mapq, self.read_filter_flag)
    }

    pub fn telomere_array_matcher(&self) -> TelomereArrayMatcher {
        TelomereArrayMatcher::new(
            &self.telomere_seqs(),
            self.telo_array_size,
            self.telo_max_edit_distance as u8,
        )
    }

    pub fn telomere_array_locator(&self) -> TelomereArrayLocator {
        TelomereArrayLocator::new(
            &self.telomere_seqs(),
            self.telo_array_size,
            self.telo_max_edit_distance as u8,
            self.telo_array_window,
        )
    }

    fn log(&self) {
        info!("Breakpoint detection parameters:");
        info!(
            "    telomere unit: {} ({} tandem copies, at most {} edits)",
            self.telomere_forward_seq, self.telo_array_size, self.telo_max_edit_distance
        );
        info!(
            "    breakpoint types: {}",
            self.breakpoint_types.iter().join(", ")
        );
        info!(
            "    reads: min MAPQ {}, excluded flags {}",
            self.min_mapq, self.read_filter_flag
        );
        info!(
            "    coverage window: {}, clustering threshold: {}, min supporting reads: {}",
            self.cov_window_size, self.clustering_threshold, self.min_supporting_reads
        );
        info!(
            "    scan strategy: {}, threads: {}",
            self.strategy, self.threads
        );
    }
}

/// Regions to scan for the given breakpoint type.
///
/// G2S breakpoints are searched for around the telomere arrays of the
/// reference that lie in the requested regions.
fn scan_regions_for<R: ReferenceSource>(
    breakpoint_type: BreakpointType,
    regions: &[Region],
    reference: &R,
    params: &DetectionParams,
) -> Result<Vec<Region>> {
    match breakpoint_type {
        BreakpointType::S2G => Ok(regions.to_vec()),
        BreakpointType::G2S => {
            let arrays = params
                .telomere_array_locator()
                .locate_all(reference, regions)?;
            info!(
                "Found {} telomere arrays to scan for G2S breakpoints",
                arrays.len()
            );
            Ok(arrays.iter().map(|array| array.to_region()).collect())
        }
    }
}

/// Run breakpoint detection over the regions and write all outputs to `outdir`.
///
/// `open_alignments` is called once per scanned region, by the worker scanning
/// it. Returns the maximal foci, sorted by decreasing support.
pub fn find_breakpoints<A, O, R>(
    open_alignments: O,
    reference: &R,
    regions: &[Region],
    params: &DetectionParams,
    outdir: &Path,
) -> Result<Vec<MaximalFocus>>
where
    A: AlignmentSource,
    O: Fn() -> Result<A> + Sync,
    R: ReferenceSource,
{
    params.validate()?;
    params.log();
    fs::create_dir_all(outdir)
        .with_context(|| format!("Failed to create output directory {}", outdir.display()))?;

    let matcher = params.telomere_array_matcher();
    let mut tables = Vec::new();
    for breakpoint_type in params.breakpoint_types() {
        let type_regions = scan_regions_for(*breakpoint_type, regions, reference, params)?;
        info!(
            "Scanning {} regions for {} breakpoints",
            type_regions.len(),
            breakpoint_type
        );
        let scanner = RegionScanner::new(
            &matcher,
            params.read_filter(),
            *breakpoint_type,
            params.cov_window_size,
            params.strategy,
        );
        tables.extend(scan_regions(
            &open_alignments,
            &scanner,
            &type_regions,
            outdir,
            params.threads,
        )?);
    }

    let foci_path = outdir.join(FOCI_FILENAME);
    let merged = merge_foci_tables(&tables, &foci_path)?;
    drop(tables);
    info!("Wrote {} breakpoint foci to {}", merged, foci_path.display());
    let foci = read_foci(&foci_path)?;

    let windows = cluster_breakpoint_foci(foci, params.clustering_threshold as i64);
    let maximal_foci = select_maximal_foci(&windows, params.min_supporting_reads);
    info!(
        "Clustered foci into {} windows, {} with at least {} supporting reads",
        windows.len(),
        maximal_foci.len(),
        params.min_supporting_reads
    );

    let (s2g, others): (Vec<_>, Vec<_>) = maximal_foci
        .into_iter()
        .partition(|focus| focus.breakpoint_type == Some(BreakpointType::S2G));
    let mut maximal_foci =
        remove_breakpoints_in_telomere_arrays(reference, &params.telomere_array_locator(), s2g)?;
    maximal_foci.extend(others);
    maximal_foci.sort_by(|a, b| b.max_value.cmp(&a.max_value));

    let locations_path = outdir.join(BREAKPOINT_LOCATIONS_FILENAME);
    write_breakpoint_locations(&maximal_foci, &locations_path)?;
    let sequences = extract_breakpoint_sequences(&maximal_foci, reference, params.seq_window_size)?;
    let sequences_path = outdir.join(BREAKPOINT_SEQUENCES_FILENAME);
    write_breakpoint_sequences(&sequences, &sequences_path)?;
    info!(
        "Wrote {} breakpoints to {} and {}",
        maximal_foci.len(),
        locations_path.display(),
        sequences_path.display()
    );

    Ok(maximal_foci)
}
