//! Record types, stream ordering and the merge-join that annotates variant
//! calls with allelic depth.
//!
//! The core ([`engine`], [`window`]) is format-agnostic and pulls from the
//! [`CallSource`] / [`AlignmentSource`] traits; [`vcf`] and [`io`] adapt
//! those traits to files.

pub mod chromosome;
pub mod engine;
pub mod filter;
pub mod io;
pub mod order;
mod statistics;
mod types;
pub mod vcf;
pub mod window;

pub use chromosome::{ChromosomeOrder, LexicographicOrder, NaturalChromosomeOrder};
pub use engine::{
    classify_base, overlaps, precedes, process, update_allele_count, AlignmentSource, CallSink,
    CallSource, MergeJoinEngine,
};
pub use filter::{QualityFilter, MAPQ_UNAVAILABLE};
pub use io::{annotated_output_path, create_output, is_compressed, open_calls, SamReader};
pub use order::{Advance, OrderValidator};
pub use statistics::RunStats;
pub use types::{Alignment, Allele, AlleleCounts, VariantCall};
pub use vcf::{render_vcf, write_vcf, VcfHeader, VcfReader, VcfWriter};
pub use window::{
    AlignmentWindow, WindowConfig, DEFAULT_GROWTH_FACTOR, DEFAULT_INITIAL_CAPACITY,
    DEFAULT_MAX_CAPACITY,
};
