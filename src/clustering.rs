// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Greedy windowing of breakpoint foci and selection of the best supported
//! focus per window.

use std::collections::HashMap;

use strum::IntoEnumIterator;

use crate::foci::{BreakpointRecord, BreakpointType, Orientation};

/// A group of nearby foci, spanning `[min, max]`.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct FociWindow {
    contig: String,
    breakpoint_type: Option<BreakpointType>,
    min: i64,
    max: i64,
    foci: Vec<BreakpointRecord>,
}

impl FociWindow {
    pub fn new(focus: BreakpointRecord) -> Self {
        FociWindow {
            contig: focus.contig.clone(),
            breakpoint_type: focus.breakpoint_type,
            min: focus.start,
            max: focus.end,
            foci: vec![focus],
        }
    }

    /// Whether the focus overlaps the window or lies within `tolerance` of it.
    pub fn includes(&self, focus: &BreakpointRecord, tolerance: i64) -> bool {
        focus.start <= self.max + tolerance && focus.end >= self.min - tolerance
    }

    pub fn add(&mut self, focus: BreakpointRecord) {
        self.min = self.min.min(focus.start);
        self.max = self.max.max(focus.end);
        self.foci.push(focus);
    }

    /// The focus with the highest support of any orientation.
    ///
    /// Within an orientation, ties keep the first seen focus. Forward wins
    /// unless reverse has a strictly higher maximum.
    pub fn find_peak_softclip_focus(&self) -> Option<MaximalFocus> {
        let mut trackers: HashMap<Orientation, PeakTracker> = Orientation::iter()
            .map(|orientation| (orientation, PeakTracker::default()))
            .collect();
        for focus in &self.foci {
            for (orientation, tracker) in trackers.iter_mut() {
                tracker.update(focus.support(*orientation), focus);
            }
        }

        let forward = &trackers[&Orientation::Forward];
        let reverse = &trackers[&Orientation::Reverse];
        let (orientation, winner, other) = if reverse.max > forward.max {
            (Orientation::Reverse, reverse, forward)
        } else {
            (Orientation::Forward, forward, reverse)
        };
        let focus = winner.focus.or_else(|| self.foci.first())?;

        Some(MaximalFocus {
            orientation,
            max_value: winner.max,
            next_max_value: winner.next,
            max_value_other_orientation: other.max,
            interval: (self.min, self.max),
            focus: focus.clone(),
            breakpoint_type: self.breakpoint_type,
        })
    }
}

#[derive(Debug, Default)]
struct PeakTracker<'a> {
    max: u32,
    next: u32,
    focus: Option<&'a BreakpointRecord>,
}

impl<'a> PeakTracker<'a> {
    fn update(&mut self, value: u32, focus: &'a BreakpointRecord) {
        if value > self.max {
            self.next = self.max;
            self.max = value;
            self.focus = Some(focus);
        } else if value > self.next {
            self.next = value;
        }
    }
}

/// The winning focus of a window.
#[derive(Debug, Clone, PartialEq)]
pub struct MaximalFocus {
    pub orientation: Orientation,
    pub max_value: u32,
    /// Second highest support in the winning orientation.
    pub next_max_value: u32,
    pub max_value_other_orientation: u32,
    /// Window bounds `(min, max)`.
    pub interval: (i64, i64),
    pub focus: BreakpointRecord,
    pub breakpoint_type: Option<BreakpointType>,
}

impl MaximalFocus {
    pub fn contig(&self) -> &str {
        &self.focus.contig
    }

    pub fn position(&self) -> i64 {
        self.focus.start
    }
}

/// Group foci into windows, in a single pass over the given order.
///
/// A focus joins the first window of its contig and breakpoint type that
/// includes it, or opens a new one. Foci without any soft-clip support are
/// skipped. Windows are returned in creation order.
pub fn cluster_breakpoint_foci<I>(foci: I, tolerance: i64) -> Vec<FociWindow>
where
    I: IntoIterator<Item = BreakpointRecord>,
{
    let mut windows: Vec<FociWindow> = Vec::new();
    let mut by_contig: HashMap<(String, Option<BreakpointType>), Vec<usize>> = HashMap::new();

    for focus in foci {
        if focus.total_support() == 0 {
            continue;
        }
        let contig_windows = by_contig
            .entry((focus.contig.clone(), focus.breakpoint_type))
            .or_insert_with(Vec::new);
        match contig_windows
            .iter()
            .copied()
            .find(|idx| windows[*idx].includes(&focus, tolerance))
        {
            Some(idx) => windows[idx].add(focus),
            None => {
                contig_windows.push(windows.len());
                windows.push(FociWindow::new(focus));
            }
        }
    }

    windows
}

/// Reduce each window to its maximal focus, drop those below
/// `min_supporting_reads` and sort by decreasing support.
pub fn select_maximal_foci(windows: &[FociWindow], min_supporting_reads: u32) -> Vec<MaximalFocus> {
    let mut maximal_foci: Vec<_> = windows
        .iter()
        .filter_map(|window| window.find_peak_softclip_focus())
        .filter(|focus| focus.max_value >= min_supporting_reads)
        .collect();
    maximal_foci.sort_by(|a, b| b.max_value.cmp(&a.max_value));
    maximal_foci
}
