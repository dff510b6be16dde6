// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Telomere arrays present in the reference genome.

use anyhow::Result;
use bio::pattern_matching::myers::Myers;
use itertools::Itertools;

use crate::clustering::MaximalFocus;
use crate::foci::telomeres::TelomereSeqs;
use crate::foci::Orientation;
use crate::reference::ReferenceSource;
use crate::utils::regions::{Interval, Region};

/// Finds approximate occurrences of the telomere array, in both orientations.
pub struct TelomereArrayLocator {
    arrays: Vec<Myers<u128>>,
    array_len: usize,
    max_edit_distance: u8,
    window: u64,
}

impl TelomereArrayLocator {
    /// Hits are reported widened by `window` bases on either side.
    pub fn new(
        telomere_seqs: &TelomereSeqs,
        array_size: usize,
        max_edit_distance: u8,
        window: u64,
    ) -> Self {
        let forward = telomere_seqs.array(Orientation::Forward, array_size);
        let reverse = telomere_seqs.array(Orientation::Reverse, array_size);
        TelomereArrayLocator {
            array_len: forward.len(),
            arrays: vec![Myers::<u128>::new(&forward), Myers::<u128>::new(&reverse)],
            max_edit_distance,
            window,
        }
    }

    pub fn array_len(&self) -> usize {
        self.array_len
    }

    /// Telomere arrays in the region, widened and merged, sorted by start.
    pub fn locate<R: ReferenceSource>(&self, reference: &R, region: &Region) -> Result<Vec<Interval>> {
        let contig_len = reference.contig_seq(&region.contig)?.len() as u64;
        let start = region.start.unwrap_or(0).min(contig_len);
        let end = region.end.unwrap_or(contig_len).min(contig_len);
        let seq = reference
            .fetch(&region.contig, start as i64, end as i64)?
            .to_ascii_uppercase();

        let hits = self
            .arrays
            .iter()
            .flat_map(|myers| {
                myers
                    .find_all_end(seq.iter(), self.max_edit_distance)
                    .map(|(hit_end, _)| {
                        let hit_end = start + hit_end as u64 + 1;
                        Interval::new(
                            region.contig.clone(),
                            hit_end.saturating_sub(self.array_len as u64),
                            hit_end,
                        )
                        .widen(self.window, Some(contig_len))
                    })
                    .collect::<Vec<_>>()
            })
            .sorted_by_key(|interval| (interval.start, interval.end))
            .coalesce(|a, b| {
                if b.start <= a.end {
                    Ok(Interval::new(a.contig, a.start, a.end.max(b.end)))
                } else {
                    Err((a, b))
                }
            })
            .collect();

        Ok(hits)
    }

    pub fn locate_all<R: ReferenceSource>(
        &self,
        reference: &R,
        regions: &[Region],
    ) -> Result<Vec<Interval>> {
        let mut arrays = Vec::new();
        for region in regions {
            let located = self.locate(reference, region)?;
            debug!("Found {} telomere arrays in {}", located.len(), region);
            arrays.extend(located);
        }
        Ok(arrays)
    }

    /// Whether a telomere array lies within the array length of the focus window.
    pub fn overlaps_telomere_array<R: ReferenceSource>(
        &self,
        reference: &R,
        maximal_focus: &MaximalFocus,
    ) -> Result<bool> {
        let (min, max) = maximal_focus.interval;
        let search_region = Region::bounded(
            maximal_focus.contig(),
            (min - self.array_len as i64).max(0) as u64,
            (max + self.array_len as i64).max(0) as u64,
        );
        Ok(!self.locate(reference, &search_region)?.is_empty())
    }
}

/// Drop maximal foci lying inside genuine telomere arrays of the reference.
pub fn remove_breakpoints_in_telomere_arrays<R: ReferenceSource>(
    reference: &R,
    locator: &TelomereArrayLocator,
    maximal_foci: Vec<MaximalFocus>,
) -> Result<Vec<MaximalFocus>> {
    let total = maximal_foci.len();
    let mut kept = Vec::with_capacity(total);
    for maximal_focus in maximal_foci {
        if !locator.overlaps_telomere_array(reference, &maximal_focus)? {
            kept.push(maximal_focus);
        }
    }
    info!(
        "Discarded {} of {} maximal foci lying in telomere arrays",
        total - kept.len(),
        total
    );
    Ok(kept)
}
