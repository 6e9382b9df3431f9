use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ad2vcf::genomics::{annotated_output_path, create_output, open_calls, SamReader, VcfWriter};
use ad2vcf::{
    process, AnnotateError, AnnotationConfig, ChromosomeOrder, LexicographicOrder,
    NaturalChromosomeOrder, RunStats, WindowConfig,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "ad2vcf",
    version,
    about = "Annotate VCF calls with allelic depth (AD) and depth (DP) from sorted alignments"
)]
struct Cli {
    /// Single-sample VCF sorted by chromosome and position (.vcf, .vcf.gz or .vcf.bgz).
    vcf: PathBuf,
    /// Coordinate-sorted SAM/BAM/CRAM; standard input when omitted or `-`.
    alignments: Option<PathBuf>,
    /// Discard alignments with mapping quality below this value.
    #[arg(long, default_value_t = ad2vcf::DEFAULT_MIN_MAPQ)]
    min_mapq: u8,
    /// Alignment window slots allocated up front; 1024 unless set, capped at --max-window.
    #[arg(long)]
    initial_window: Option<usize>,
    /// Window growth multiplier.
    #[arg(long, default_value_t = ad2vcf::genomics::DEFAULT_GROWTH_FACTOR)]
    growth_factor: usize,
    /// Hard ceiling on buffered alignments.
    #[arg(long, default_value_t = ad2vcf::genomics::DEFAULT_MAX_CAPACITY)]
    max_window: usize,
    /// How chromosome names are ordered in both inputs.
    #[arg(long, value_enum, default_value_t = OrderArg::Natural)]
    chromosome_order: OrderArg,
    /// Output path; `-` for standard output. Defaults to the VCF name with
    /// `-ad` inserted before `.vcf`.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    /// chr1 < chr2 < ... < chr22 < chrX < chrY < chrM.
    Natural,
    /// Plain byte order of the names.
    Lexicographic,
}

impl OrderArg {
    fn comparator(self) -> Box<dyn ChromosomeOrder> {
        match self {
            OrderArg::Natural => Box::new(NaturalChromosomeOrder),
            OrderArg::Lexicographic => Box::new(LexicographicOrder),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli) {
        Ok(stats) => {
            stats.log_summary();
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ad2vcf: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AnnotateError>())
        .map_or(1, AnnotateError::exit_code)
}

/// Window policy from the flags. An explicit starting capacity is kept as
/// given so that one above the ceiling is still rejected.
fn window_config(cli: &Cli) -> WindowConfig {
    let window = WindowConfig::default()
        .with_growth_factor(cli.growth_factor)
        .with_max_capacity(cli.max_window);
    match cli.initial_window {
        Some(initial) => window.with_initial_capacity(initial),
        None => window,
    }
}

fn run(cli: &Cli) -> Result<RunStats> {
    let config = AnnotationConfig::default()
        .with_min_mapq(cli.min_mapq)
        .with_window(window_config(cli));
    config.validate()?;

    let output_path = match &cli.output {
        Some(path) => path.clone(),
        None => annotated_output_path(&cli.vcf)?,
    };

    let mut calls = open_calls(&cli.vcf)
        .with_context(|| format!("failed to read VCF header from {}", cli.vcf.display()))?;
    let mut alignments = open_alignments(cli.alignments.as_deref())?;
    let output = create_output(&output_path)?;
    let mut writer = VcfWriter::new(output, calls.header())
        .with_context(|| format!("failed to write header to {}", output_path.display()))?;

    info!(
        vcf = %cli.vcf.display(),
        output = %output_path.display(),
        min_mapq = config.min_mapq,
        "annotating calls"
    );

    let stats = process(
        &mut calls,
        &mut alignments,
        &mut writer,
        cli.chromosome_order.comparator(),
        &config,
    )?;
    writer
        .finish()
        .with_context(|| format!("failed to flush {}", output_path.display()))?;

    if alignments.unmapped_skipped() > 0 {
        warn!(count = alignments.unmapped_skipped(), "unmapped alignments skipped");
    }
    Ok(stats)
}

fn open_alignments(path: Option<&Path>) -> Result<SamReader> {
    match path {
        None => SamReader::from_stdin().context("failed to read alignments from standard input"),
        Some(path) if path.as_os_str() == "-" => {
            SamReader::from_stdin().context("failed to read alignments from standard input")
        }
        Some(path) => SamReader::from_path(path)
            .map_err(|err| match err {
                AnnotateError::Htslib(source) => AnnotateError::Open {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, source.to_string()),
                },
                other => other,
            })
            .map_err(anyhow::Error::from),
    }
}
