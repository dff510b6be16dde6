// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use crate::foci::{BreakpointRecord, BreakpointType, Orientation};
use crate::utils::contiguous_ranges;

/// Streaming per-position evidence table of one region scan.
///
/// Soft-clip and coverage events are recorded in non-decreasing scan order.
/// Records stay open while evidence may still reach them and are committed once
/// the scan has moved more than `cov_window` positions past them, provided that
/// they lie within `cov_window` of some soft-clip evidence. All other records
/// are dropped on the way.
#[derive(Debug, Getters)]
pub struct PositionLedger {
    #[getset(get = "pub")]
    contig: String,
    #[getset(get = "pub")]
    breakpoint_type: BreakpointType,
    #[getset(get = "pub")]
    cov_window: i64,
    open: BTreeMap<i64, BreakpointRecord>,
    marked: BTreeSet<i64>,
    /// Positions below this have been committed or dropped.
    sealed_before: Option<i64>,
    #[getset(get = "pub")]
    peak_open: usize,
    #[getset(get = "pub")]
    committed: usize,
    /// Events that arrived for positions already committed or dropped.
    #[getset(get = "pub")]
    ignored: usize,
}

impl PositionLedger {
    pub fn new(contig: &str, breakpoint_type: BreakpointType, cov_window: i64) -> Self {
        PositionLedger {
            contig: contig.to_owned(),
            breakpoint_type,
            cov_window,
            open: BTreeMap::new(),
            marked: BTreeSet::new(),
            sealed_before: None,
            peak_open: 0,
            committed: 0,
            ignored: 0,
        }
    }

    fn is_sealed(&self, pos: i64) -> bool {
        self.sealed_before.map_or(false, |sealed| pos < sealed)
    }

    fn open_record(&mut self, pos: i64) -> &mut BreakpointRecord {
        let contig = &self.contig;
        let breakpoint_type = self.breakpoint_type;
        self.open
            .entry(pos)
            .or_insert_with(|| BreakpointRecord::at(contig, pos, Some(breakpoint_type)));
        self.peak_open = self.peak_open.max(self.open.len());
        self.open.get_mut(&pos).unwrap()
    }

    /// Count one supporting read at `pos` and mark `[pos - W, pos + W]` as
    /// requiring coverage.
    pub fn record_softclip(&mut self, pos: i64, orientation: Orientation) {
        if self.is_sealed(pos) {
            self.ignored += 1;
            return;
        }
        *self.open_record(pos).support_mut(orientation) += 1;
        let sealed_before = self.sealed_before;
        self.marked.extend(
            (pos - self.cov_window..=pos + self.cov_window)
                .filter(|p| sealed_before.map_or(true, |sealed| *p >= sealed)),
        );
    }

    /// Set the read depth at `pos`.
    pub fn record_coverage(&mut self, pos: i64, depth: u32) {
        if self.is_sealed(pos) {
            self.ignored += 1;
            return;
        }
        self.open_record(pos).read_depth = depth;
    }

    /// Inform the ledger that the scan has reached `scan_pos`.
    ///
    /// Returns the committed records, in ascending position order.
    pub fn advance(&mut self, scan_pos: i64) -> Vec<BreakpointRecord> {
        let threshold = scan_pos - (self.cov_window + 1);
        if self.sealed_before.map_or(false, |sealed| threshold <= sealed) {
            return Vec::new();
        }
        self.sealed_before = Some(threshold);

        let remaining = self.open.split_off(&threshold);
        let passed = mem::replace(&mut self.open, remaining);
        let remaining_marks = self.marked.split_off(&threshold);
        let passed_marks = mem::replace(&mut self.marked, remaining_marks);

        let committed: Vec<_> = passed
            .into_iter()
            .filter(|(pos, _)| passed_marks.contains(pos))
            .map(|(_, record)| record)
            .collect();
        self.committed += committed.len();
        committed
    }

    /// Contiguous runs of positions requiring coverage, clamped at 0.
    pub fn marked_ranges(&self) -> Vec<(i64, i64)> {
        contiguous_ranges(&self.marked)
            .into_iter()
            .filter(|(_, last)| *last >= 0)
            .map(|(first, last)| (first.max(0), last))
            .collect()
    }

    pub fn is_marked(&self, pos: i64) -> bool {
        self.marked.contains(&pos)
    }

    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Commit all remaining open records that require coverage.
    ///
    /// This includes records at negative positions (arrays running over the
    /// 5' end of the contig), which no pileup column ever reaches.
    pub fn finish(mut self) -> Vec<BreakpointRecord> {
        let marked = mem::take(&mut self.marked);
        let committed: Vec<_> = mem::take(&mut self.open)
            .into_iter()
            .filter(|(pos, _)| marked.contains(pos))
            .map(|(pos, record)| {
                if pos < 0 {
                    debug!(
                        "Salvaging breakpoint focus at negative position {}:{}",
                        self.contig, pos
                    );
                }
                record
            })
            .collect();
        self.committed += committed.len();
        if self.ignored > 0 {
            debug!(
                "Ignored {} events at already committed positions of {}",
                self.ignored, self.contig
            );
        }
        committed
    }
}
