// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

/// Telomeric repeat unit of nematodes, forward (5'->3') orientation.
pub const NEMATODA_TELOMERE_FORWARD: &str = "TTAGGC";

pub const DEFAULT_TELO_ARRAY_SIZE: usize = 10;
pub const DEFAULT_TELO_MAX_EDIT_DISTANCE: u32 = 3;
/// Half-width added either side of a telomere array located in the reference.
pub const DEFAULT_TELO_ARRAY_WINDOW: u64 = 10;
pub const DEFAULT_COV_WINDOW_SIZE: i64 = 5;
pub const DEFAULT_MIN_MAPQ: u8 = 20;
/// Secondary, QC-fail, duplicate and supplementary alignments.
pub const DEFAULT_READ_FILTER_FLAG: u16 = 3840;
pub const DEFAULT_CLUSTERING_THRESHOLD: u64 = 5;
pub const DEFAULT_MIN_SUPPORTING_READS: u32 = 10;
pub const DEFAULT_SEQ_WINDOW_SIZE: u64 = 350;

/// Longest motif array the bit-parallel matcher can handle.
pub const MAX_TELOMERE_ARRAY_LEN: usize = 128;

/// Separator used in composite identifiers (e.g. FASTA record ids).
pub const ID_DELIM: &str = "__";

pub const FOCI_FILENAME: &str = "breakpoint_foci.tsv";
pub const BREAKPOINT_LOCATIONS_FILENAME: &str = "breakpoint_locations.bed";
pub const BREAKPOINT_SEQUENCES_FILENAME: &str = "breakpoint_sequences.fasta";

/// Number of whole contigs kept decoded in the reference buffer.
pub const REFERENCE_BUFFER_CAPACITY: usize = 2;
