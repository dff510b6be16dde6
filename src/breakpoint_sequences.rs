// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::fasta;
use itertools::Itertools;

use crate::clustering::MaximalFocus;
use crate::constants::ID_DELIM;
use crate::foci::Orientation;
use crate::reference::ReferenceSource;
use crate::utils::rev_comp;

/// Placeholder base marking the breakpoint.
const BREAKPOINT_BASE: u8 = b'N';

/// Reference sequence flanking a breakpoint, oriented breakpoint-outward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointSequence {
    pub id: String,
    pub description: String,
    pub sequence: Vec<u8>,
}

impl BreakpointSequence {
    fn id(maximal_focus: &MaximalFocus) -> String {
        let breakpoint_type = maximal_focus
            .breakpoint_type
            .map_or("unset", |breakpoint_type| breakpoint_type.into());
        let strand = maximal_focus.orientation.strand();
        let position = maximal_focus.position().to_string();
        [
            breakpoint_type,
            strand.strand_symbol(),
            maximal_focus.contig(),
            position.as_str(),
        ]
        .iter()
        .join(ID_DELIM)
    }

    fn description(maximal_focus: &MaximalFocus) -> String {
        format!(
            "max_value={};next_max_value={};max_value_other_orientation={}",
            maximal_focus.max_value,
            maximal_focus.next_max_value,
            maximal_focus.max_value_other_orientation
        )
    }
}

/// Extract `seq_window_size` bases either side of each breakpoint.
///
/// The flanks are clamped to the contig bounds and joined by a placeholder
/// base; sequences of reverse orientation foci are reverse complemented.
pub fn extract_breakpoint_sequences<R: ReferenceSource>(
    maximal_foci: &[MaximalFocus],
    reference: &R,
    seq_window_size: u64,
) -> Result<Vec<BreakpointSequence>> {
    let window = seq_window_size as i64;
    maximal_foci
        .iter()
        .map(|maximal_focus| {
            let pos = maximal_focus.position().max(0);
            let contig = maximal_focus.contig();
            let mut sequence = reference.fetch(contig, pos - window, pos)?;
            sequence.push(BREAKPOINT_BASE);
            sequence.extend(reference.fetch(contig, pos, pos + window)?);
            if maximal_focus.orientation == Orientation::Reverse {
                sequence = rev_comp(&sequence);
            }
            Ok(BreakpointSequence {
                id: BreakpointSequence::id(maximal_focus),
                description: BreakpointSequence::description(maximal_focus),
                sequence,
            })
        })
        .collect()
}

pub fn write_breakpoint_sequences<P: AsRef<Path>>(
    sequences: &[BreakpointSequence],
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create breakpoint sequences {}", path.display()))?;
    let mut writer = fasta::Writer::new(file);
    for sequence in sequences {
        writer.write(&sequence.id, Some(sequence.description.as_str()), &sequence.sequence)?;
    }
    writer.flush()?;
    Ok(())
}
