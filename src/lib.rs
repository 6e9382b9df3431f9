//! # Allelic depth annotation via a coordinate merge-join
//!
//! This library annotates single-sample VCF calls with allelic depth
//! (`AD`) and read depth (`DP`) counted from a coordinate-sorted alignment
//! stream (SAM, BAM or CRAM).
//!
//! ## Core Algorithm
//!
//! 1. **Two sorted streams**: calls and alignments both arrive ordered by
//!    (chromosome, position); each stream is validated as it is consumed.
//! 2. **Skip phase**: alignments that end before the current call can never
//!    matter again and are evicted from the in-flight window.
//! 3. **Scan phase**: buffered and freshly read alignments covering the call
//!    are tallied as reference, alternate or other base, stopping at the
//!    first alignment that starts past the call.
//! 4. **Bounded window**: buffered alignments live in a growable window with
//!    a hard ceiling, so coverage spikes cannot grow memory without limit.
//!
//! Memory is proportional to the alignments in play at one position, not to
//! the size of either input.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ad2vcf::{process, AnnotationConfig, NaturalChromosomeOrder};
//!
//! let config = AnnotationConfig::default().with_min_mapq(20);
//! let stats = process(&mut calls, alignments, &mut writer, NaturalChromosomeOrder, &config)?;
//! stats.log_summary();
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod genomics; // Merge-join core, record types and formats

// Re-exports for convenience
pub use genomics::{
    process, Alignment, AlignmentSource, AlignmentWindow, AlleleCounts, CallSink, CallSource,
    ChromosomeOrder, LexicographicOrder, MergeJoinEngine, NaturalChromosomeOrder,
    OrderValidator, QualityFilter, RunStats, VariantCall, WindowConfig,
};

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Default minimum mapping quality for an alignment to be counted.
pub const DEFAULT_MIN_MAPQ: u8 = 10;

/// Which input stream a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// VCF call stream.
    Calls,
    /// SAM/BAM/CRAM alignment stream.
    Alignments,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Calls => f.write_str("VCF"),
            StreamKind::Alignments => f.write_str("alignment"),
        }
    }
}

/// Errors that can abort an annotation run.
#[derive(Error, Debug)]
pub enum AnnotateError {
    /// A stream regressed in (chromosome, position) order.
    #[error(
        "{stream} input must be sorted by chromosome then position: \
         {chromosome}:{position} follows {previous_chromosome}:{previous_position}"
    )]
    OrderingViolation {
        /// Stream that went out of order.
        stream: StreamKind,
        /// Chromosome of the offending record.
        chromosome: String,
        /// Position of the offending record.
        position: u64,
        /// Chromosome of the record seen before it.
        previous_chromosome: String,
        /// Position of the record seen before it.
        previous_position: u64,
    },

    /// The alignment window is full and may not grow any further.
    #[error(
        "alignment window exceeded {max_capacity} buffered alignments at \
         {chromosome}:{position}; coverage is pathological or input is unsorted"
    )]
    CapacityExceeded {
        /// Configured hard ceiling.
        max_capacity: usize,
        /// Chromosome of the alignment that could not be buffered.
        chromosome: String,
        /// Position of the alignment that could not be buffered.
        position: u64,
    },

    /// Configuration values rejected before the run started.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed VCF text.
    #[error("VCF line {line}: {message}")]
    Parse {
        /// 1-based line number within the VCF input.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// Input that is well-formed but outside what the annotator handles.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// Output file name could not be derived from the input name.
    #[error("cannot derive output name from {0:?}: input filename must contain \".vcf\"")]
    InvalidOutputName(PathBuf),

    /// An input file could not be opened.
    #[error("cannot open {path:?}: {source}")]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created.
    #[error("cannot create {path:?}: {source}")]
    Create {
        /// Path that failed to be created.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Error reported by htslib while opening an input.
    #[error("htslib: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    /// htslib could not decode an alignment record mid-stream.
    #[error("cannot read alignment record {record}: {source}")]
    AlignmentRecord {
        /// 1-based index of the record in the alignment stream.
        record: u64,
        /// Underlying htslib error.
        #[source]
        source: rust_htslib::errors::Error,
    },

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnnotateError {
    /// Process exit status following BSD `sysexits.h`.
    pub fn exit_code(&self) -> u8 {
        const EX_USAGE: u8 = 64;
        const EX_DATAERR: u8 = 65;
        const EX_NOINPUT: u8 = 66;
        const EX_CANTCREAT: u8 = 73;
        const EX_IOERR: u8 = 74;

        match self {
            AnnotateError::OrderingViolation { .. }
            | AnnotateError::CapacityExceeded { .. }
            | AnnotateError::Parse { .. }
            | AnnotateError::UnsupportedInput(_)
            | AnnotateError::InvalidOutputName(_)
            | AnnotateError::AlignmentRecord { .. } => EX_DATAERR,
            AnnotateError::InvalidConfiguration(_) => EX_USAGE,
            AnnotateError::Open { .. } | AnnotateError::Htslib(_) => EX_NOINPUT,
            AnnotateError::Create { .. } => EX_CANTCREAT,
            AnnotateError::Io(_) => EX_IOERR,
        }
    }
}

/// Parameters for one annotation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationConfig {
    /// Alignments with a lower mapping quality are discarded.
    pub min_mapq: u8,
    /// Growth policy of the in-flight alignment window.
    pub window: WindowConfig,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            min_mapq: DEFAULT_MIN_MAPQ,
            window: WindowConfig::default(),
        }
    }
}

impl AnnotationConfig {
    /// Set the mapping-quality threshold.
    pub fn with_min_mapq(mut self, min_mapq: u8) -> Self {
        self.min_mapq = min_mapq;
        self
    }

    /// Replace the window growth policy.
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Shorthand for overriding only the window's hard ceiling.
    pub fn with_max_window_capacity(mut self, max_capacity: usize) -> Self {
        self.window = self.window.with_max_capacity(max_capacity);
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), AnnotateError> {
        self.window.validate()
    }
}
