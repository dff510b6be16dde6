// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::alignment::{AlignedRead, AlignmentSource, ReadFilter};
use crate::foci::ledger::PositionLedger;
use crate::foci::softclips::{find_softclip_at_extremity, SoftclipObservation};
use crate::foci::telomeres::TelomereArrayMatcher;
use crate::foci::{BreakpointRecord, BreakpointType, Orientation};
use crate::utils::regions::Region;

/// How a region's reads and pileup are combined into foci.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ScanStrategy {
    /// A single pileup pass: reads are classified when their first aligned
    /// base is reached, coverage is folded in column by column.
    Streaming,
    /// A read pass collecting evidence, followed by pileups restricted to the
    /// positions requiring coverage.
    TwoPass,
}

impl Default for ScanStrategy {
    fn default() -> Self {
        ScanStrategy::Streaming
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, new)]
pub struct ScanStats {
    pub committed: usize,
    pub peak_open: usize,
}

/// Scans a single region for soft-clip breakpoint evidence of one breakpoint type.
#[derive(new)]
pub struct RegionScanner<'a> {
    matcher: &'a TelomereArrayMatcher,
    filter: ReadFilter,
    breakpoint_type: BreakpointType,
    cov_window: i64,
    strategy: ScanStrategy,
}

impl<'a> RegionScanner<'a> {
    fn supports(&self, observation: &SoftclipObservation, orientation: Orientation) -> bool {
        let has_array = self
            .matcher
            .has_softclipped_telo_array(observation, orientation);
        match self.breakpoint_type {
            BreakpointType::S2G => has_array,
            BreakpointType::G2S => !has_array && observation.clip_len >= self.matcher.array_len(),
        }
    }

    fn collect_evidence(&self, read: &AlignedRead, ledger: &mut PositionLedger) {
        if !self.filter.passes(read) {
            return;
        }
        for orientation in Orientation::iter() {
            if let Some(observation) = find_softclip_at_extremity(read, orientation) {
                if self.supports(&observation, orientation) {
                    trace!(
                        "Read {} supports a {} breakpoint at {}:{} ({})",
                        observation.read_name,
                        self.breakpoint_type,
                        read.contig,
                        observation.reference_position,
                        orientation
                    );
                    ledger.record_softclip(observation.reference_position, orientation);
                }
            }
        }
    }

    /// Scan the region and pass each committed record to `emit`, in ascending
    /// position order.
    pub fn scan<A, F>(&self, source: &mut A, region: &Region, mut emit: F) -> Result<ScanStats>
    where
        A: AlignmentSource,
        F: FnMut(BreakpointRecord) -> Result<()>,
    {
        let mut ledger = PositionLedger::new(&region.contig, self.breakpoint_type, self.cov_window);
        let mut committed = 0;

        match self.strategy {
            ScanStrategy::Streaming => {
                source.for_each_column(region, None, &self.filter, |column| {
                    for read in &column.heads {
                        self.collect_evidence(read, &mut ledger);
                    }
                    ledger.record_coverage(column.pos, column.depth);
                    for record in ledger.advance(column.pos) {
                        committed += 1;
                        emit(record)?;
                    }
                    Ok(())
                })?;
            }
            ScanStrategy::TwoPass => {
                source.for_each_read(region, |read| {
                    self.collect_evidence(&read, &mut ledger);
                    Ok(())
                })?;
                for range in ledger.marked_ranges() {
                    source.for_each_column(region, Some(range), &self.filter, |column| {
                        ledger.record_coverage(column.pos, column.depth);
                        Ok(())
                    })?;
                }
            }
        }

        let peak_open = *ledger.peak_open();
        for record in ledger.finish() {
            committed += 1;
            emit(record)?;
        }
        debug!(
            "Scanned {} ({}, {}): {} foci committed, at most {} open",
            region, self.breakpoint_type, self.strategy, committed, peak_open
        );

        Ok(ScanStats::new(committed, peak_open))
    }
}
