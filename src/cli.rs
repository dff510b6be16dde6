// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::{Path, PathBuf};

use anyhow::Result;
use structopt::StructOpt;

use crate::alignment::htslib::IndexedBam;
use crate::alignment::AlignmentSource;
use crate::calling::{find_breakpoints, DetectionParams, DetectionParamsBuilder};
use crate::foci::scanner::ScanStrategy;
use crate::foci::BreakpointType;
use crate::output::write_telomere_arrays;
use crate::reference::{FastaReference, ReferenceSource};
use crate::utils::regions::{regions_from_bed, whole_genome, Region};

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "telobreak",
    about = "Locate DNA-elimination breakpoints marked by soft-clipped telomere arrays.",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
pub enum Telobreak {
    #[structopt(
        name = "find-breakpoints",
        about = "Find breakpoints from soft-clipped reads in an indexed BAM/CRAM file.",
        setting = structopt::clap::AppSettings::ColoredHelp
    )]
    FindBreakpoints {
        #[structopt(parse(from_os_str), help = "Indexed BAM/CRAM file with aligned reads.")]
        bam: PathBuf,
        #[structopt(
            parse(from_os_str),
            help = "FASTA file with the reference genome. Used indexed if a .fai index is present."
        )]
        reference: PathBuf,
        #[structopt(
            parse(from_os_str),
            long,
            help = "Directory to write breakpoint foci, locations and sequences to."
        )]
        outdir: PathBuf,
        #[structopt(flatten)]
        regions: RegionArgs,
        #[structopt(flatten)]
        telomeres: TelomereArgs,
        #[structopt(
            long,
            default_value = "5",
            help = "Number of positions either side of a soft-clip at which read depth is recorded."
        )]
        cov_window_size: i64,
        #[structopt(long, default_value = "20", help = "Minimum mapping quality of reads.")]
        min_mapq: u8,
        #[structopt(
            long,
            default_value = "3840",
            help = "Reads with any of these SAM flags set are ignored (default: secondary, QC-fail, duplicate, supplementary)."
        )]
        read_filter_flag: u16,
        #[structopt(
            long,
            default_value = "5",
            help = "Maximal distance between foci of the same breakpoint window."
        )]
        clustering_threshold: u64,
        #[structopt(
            long,
            default_value = "10",
            help = "Minimum number of soft-clipped reads supporting a reported breakpoint."
        )]
        min_supporting_reads: u32,
        #[structopt(
            long,
            default_value = "350",
            help = "Number of reference bases extracted either side of a breakpoint."
        )]
        seq_window_size: u64,
        #[structopt(
            long = "breakpoint-type",
            possible_values = &["S2G", "G2S"],
            help = "Breakpoint types to search for (repeatable, default: S2G and G2S)."
        )]
        breakpoint_types: Vec<BreakpointType>,
        #[structopt(
            long,
            default_value = "streaming",
            possible_values = &["streaming", "two-pass"],
            help = "How reads and pileups of a region are combined into foci."
        )]
        strategy: ScanStrategy,
        #[structopt(long, default_value = "1", help = "Number of regions scanned in parallel.")]
        threads: usize,
        #[structopt(short, long, help = "Print debug messages.")]
        verbose: bool,
    },
    #[structopt(
        name = "locate-telomere-arrays",
        about = "Write telomere arrays of the reference genome to a BED file.",
        setting = structopt::clap::AppSettings::ColoredHelp
    )]
    LocateTelomereArrays {
        #[structopt(parse(from_os_str), help = "FASTA file with the reference genome.")]
        reference: PathBuf,
        #[structopt(parse(from_os_str), long, help = "BED file to write telomere arrays to.")]
        output: PathBuf,
        #[structopt(flatten)]
        regions: RegionArgs,
        #[structopt(flatten)]
        telomeres: TelomereArgs,
        #[structopt(short, long, help = "Print debug messages.")]
        verbose: bool,
    },
}

impl Telobreak {
    pub fn verbose(&self) -> bool {
        match self {
            Telobreak::FindBreakpoints { verbose, .. } => *verbose,
            Telobreak::LocateTelomereArrays { verbose, .. } => *verbose,
        }
    }
}

#[derive(Debug, StructOpt, Clone, Default)]
pub struct RegionArgs {
    #[structopt(
        long,
        help = "Restrict the search to a region given as CONTIG:START-STOP."
    )]
    seq_region: Option<String>,
    #[structopt(
        parse(from_os_str),
        long,
        help = "BED file with regions to restrict the search to (overrides --seq-region)."
    )]
    bed: Option<PathBuf>,
}

impl RegionArgs {
    /// BED regions take precedence over the region string; without either,
    /// every contig is searched.
    pub fn resolve(&self, contigs: &[(String, u64)]) -> Result<Vec<Region>> {
        if let Some(ref bed) = self.bed {
            regions_from_bed(bed)
        } else if let Some(ref seq_region) = self.seq_region {
            Ok(vec![Region::parse(seq_region)?])
        } else {
            Ok(whole_genome(contigs))
        }
    }
}

#[derive(Debug, StructOpt, Clone)]
pub struct TelomereArgs {
    #[structopt(
        long,
        default_value = "TTAGGC",
        help = "Telomeric repeat unit in forward orientation (default: Nematoda)."
    )]
    telomere_forward_seq: String,
    #[structopt(
        long,
        default_value = "10",
        help = "Minimum number of tandem repeat units making up a telomere array."
    )]
    telo_array_size: usize,
    #[structopt(
        long,
        default_value = "3",
        help = "Maximal edit distance between a telomere array and the matched sequence."
    )]
    telo_max_edit_distance: u32,
    #[structopt(
        long,
        default_value = "10",
        help = "Bases added either side of telomere arrays located in the reference."
    )]
    telo_array_window: u64,
}

impl TelomereArgs {
    fn apply<'a>(&self, builder: &'a mut DetectionParamsBuilder) -> &'a mut DetectionParamsBuilder {
        builder
            .telomere_forward_seq(self.telomere_forward_seq.to_ascii_uppercase())
            .telo_array_size(self.telo_array_size)
            .telo_max_edit_distance(self.telo_max_edit_distance)
            .telo_array_window(self.telo_array_window)
    }
}

/// Detection parameters of a parsed command line.
pub fn detection_params(opt: &Telobreak) -> Result<DetectionParams> {
    let mut builder = DetectionParamsBuilder::default();
    match opt {
        Telobreak::FindBreakpoints {
            telomeres,
            cov_window_size,
            min_mapq,
            read_filter_flag,
            clustering_threshold,
            min_supporting_reads,
            seq_window_size,
            breakpoint_types,
            strategy,
            threads,
            ..
        } => {
            telomeres
                .apply(&mut builder)
                .cov_window_size(*cov_window_size)
                .min_mapq(*min_mapq)
                .read_filter_flag(*read_filter_flag)
                .clustering_threshold(*clustering_threshold)
                .min_supporting_reads(*min_supporting_reads)
                .seq_window_size(*seq_window_size)
                .strategy(*strategy)
                .threads(*threads);
            if !breakpoint_types.is_empty() {
                builder.breakpoint_types(breakpoint_types.clone());
            }
        }
        Telobreak::LocateTelomereArrays { telomeres, .. } => {
            telomeres.apply(&mut builder);
        }
    }
    let params = builder.build()?;
    params.validate()?;
    Ok(params)
}

pub fn run(opt: Telobreak) -> Result<()> {
    let params = detection_params(&opt)?;
    match opt {
        Telobreak::FindBreakpoints {
            bam,
            reference,
            outdir,
            regions,
            ..
        } => {
            let contigs = IndexedBam::from_path(&bam)?.contigs();
            let regions = regions.resolve(&contigs)?;
            let reference = FastaReference::from_path(&reference)?;
            let breakpoints = find_breakpoints(
                || IndexedBam::from_path(&bam),
                &reference,
                &regions,
                &params,
                &outdir,
            )?;
            info!("Found {} breakpoints", breakpoints.len());
            Ok(())
        }
        Telobreak::LocateTelomereArrays {
            reference,
            output,
            regions,
            ..
        } => locate_telomere_arrays(&reference, &output, &regions, &params),
    }
}

fn locate_telomere_arrays(
    reference: &Path,
    output: &Path,
    regions: &RegionArgs,
    params: &DetectionParams,
) -> Result<()> {
    let reference = FastaReference::from_path(reference)?;
    let regions = regions.resolve(&reference.contigs())?;
    let arrays = params
        .telomere_array_locator()
        .locate_all(&reference, &regions)?;
    write_telomere_arrays(&arrays, output)?;
    info!(
        "Wrote {} telomere arrays to {}",
        arrays.len(),
        output.display()
    );
    Ok(())
}
