//! Merge-join of the call stream against the alignment stream.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::genomics::order::Advance;
use crate::genomics::types::same_chrom;
use crate::genomics::{
    Alignment, AlignmentWindow, Allele, ChromosomeOrder, OrderValidator, QualityFilter, RunStats,
    VariantCall,
};
use crate::{AnnotateError, AnnotationConfig, StreamKind};

/// Pull-based supplier of variant calls in file order.
pub trait CallSource {
    /// Next call, or `None` at end of stream.
    fn next_call(&mut self) -> Result<Option<VariantCall>, AnnotateError>;
}

/// Pull-based supplier of alignments in file order.
pub trait AlignmentSource {
    /// Next alignment, or `None` at end of stream.
    fn next_alignment(&mut self) -> Result<Option<Alignment>, AnnotateError>;
}

/// Destination for annotated calls.
pub trait CallSink {
    /// Emit one call with its final allele counts.
    fn write_call(&mut self, call: &VariantCall) -> Result<(), AnnotateError>;
}

impl<T: AlignmentSource + ?Sized> AlignmentSource for &mut T {
    fn next_alignment(&mut self) -> Result<Option<Alignment>, AnnotateError> {
        (**self).next_alignment()
    }
}

impl CallSource for std::vec::IntoIter<VariantCall> {
    fn next_call(&mut self) -> Result<Option<VariantCall>, AnnotateError> {
        Ok(self.next())
    }
}

impl AlignmentSource for std::vec::IntoIter<Alignment> {
    fn next_alignment(&mut self) -> Result<Option<Alignment>, AnnotateError> {
        Ok(self.next())
    }
}

impl CallSink for Vec<VariantCall> {
    fn write_call(&mut self, call: &VariantCall) -> Result<(), AnnotateError> {
        self.push(call.clone());
        Ok(())
    }
}

/// True iff the alignment's half-open span `[start, start + len)` covers
/// the call position on the same chromosome.
#[inline]
pub fn overlaps(call: &VariantCall, alignment: &Alignment) -> bool {
    call.position >= alignment.position
        && call.position < alignment.end()
        && same_chrom(&call.chrom, &alignment.chrom)
}

/// True iff the alignment lies entirely upstream of the call: it ends at or
/// before the call position on the same chromosome, or its chromosome sorts
/// first.
#[inline]
pub fn precedes<O: ChromosomeOrder + ?Sized>(
    alignment: &Alignment,
    call: &VariantCall,
    order: &O,
) -> bool {
    if same_chrom(&alignment.chrom, &call.chrom) {
        alignment.end() <= call.position
    } else {
        order.is_before(&alignment.chrom, &call.chrom)
    }
}

/// Classify one base against the first characters of REF and ALT.
pub fn classify_base(call: &VariantCall, base: u8) -> Allele {
    if call.reference_base() == Some(base) {
        Allele::Reference
    } else if call.alternate_base() == Some(base) {
        Allele::Alternate
    } else {
        Allele::Other
    }
}

/// Tally the base the alignment carries at the call position.
pub fn update_allele_count(call: &mut VariantCall, alignment: &Alignment, stats: &mut RunStats) {
    debug_assert!(overlaps(call, alignment));
    if let Some(base) = alignment.base_at(call.position) {
        let allele = classify_base(call, base);
        call.counts.record(allele);
        stats.record_allele(allele);
    }
}

/// Per-call state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Skip,
    Scan,
    Done,
}

/// One-pass join of a sorted call stream against a sorted alignment stream.
///
/// The engine owns the alignment side: the source, the window of buffered
/// alignments, the quality filter and the alignment order validator. Calls
/// are handed in one at a time through [`annotate`](Self::annotate).
#[derive(Debug)]
pub struct MergeJoinEngine<A, O> {
    alignments: A,
    order: O,
    window: AlignmentWindow,
    filter: QualityFilter,
    alignment_order: OrderValidator,
    more_alignments: bool,
}

impl<A: AlignmentSource, O: ChromosomeOrder> MergeJoinEngine<A, O> {
    /// Create an engine over an alignment source.
    pub fn new(alignments: A, order: O, config: &AnnotationConfig) -> Result<Self, AnnotateError> {
        config.validate()?;
        Ok(Self {
            alignments,
            order,
            window: AlignmentWindow::new(config.window),
            filter: QualityFilter::new(config.min_mapq),
            alignment_order: OrderValidator::new(StreamKind::Alignments),
            more_alignments: true,
        })
    }

    /// Chromosome comparator in use.
    pub fn order(&self) -> &O {
        &self.order
    }

    /// Alignments currently buffered.
    pub fn window(&self) -> &AlignmentWindow {
        &self.window
    }

    /// Whether the alignment stream may still yield records.
    pub fn has_more_alignments(&self) -> bool {
        self.more_alignments
    }

    /// Fill in the allele counts of one call.
    ///
    /// Calls must be presented in sorted order; the caller validates that.
    pub fn annotate(&mut self, call: &mut VariantCall, stats: &mut RunStats) -> Result<(), AnnotateError> {
        let mut phase = Phase::Skip;
        loop {
            phase = match phase {
                Phase::Skip => self.skip_upstream(call, stats)?,
                Phase::Scan => {
                    self.scan_overlapping(call, stats)?;
                    Phase::Done
                }
                Phase::Done => {
                    stats.record_call(&call.counts);
                    return Ok(());
                }
            };
        }
    }

    /// Evict buffered alignments upstream of the call. With the window empty,
    /// read ahead until an alignment reaches the call and buffer it.
    fn skip_upstream(&mut self, call: &VariantCall, stats: &mut RunStats) -> Result<Phase, AnnotateError> {
        if !self.window.is_empty() {
            self.window.evict_preceding(call, &self.order);
            if !self.window.is_empty() {
                return Ok(Phase::Scan);
            }
        }

        while let Some(alignment) = self.pull_alignment(stats)? {
            if precedes(&alignment, call, &self.order) {
                stats.record_skip();
                continue;
            }
            self.window.append(alignment, stats)?;
            return Ok(Phase::Scan);
        }
        Ok(Phase::Done)
    }

    /// Count buffered alignments covering the call, then keep reading while
    /// fresh alignments still cover it.
    fn scan_overlapping(&mut self, call: &mut VariantCall, stats: &mut RunStats) -> Result<(), AnnotateError> {
        let covering = self.window.overlapping_prefix_length(call);
        for alignment in &self.window.as_slice()[..covering] {
            update_allele_count(call, alignment, stats);
        }
        // Anything left past the covering prefix starts after the call, and
        // so does everything still unread.
        if covering < self.window.len() {
            return Ok(());
        }

        while let Some(alignment) = self.pull_alignment(stats)? {
            if precedes(&alignment, call, &self.order) {
                stats.record_skip();
                continue;
            }
            let covers = overlaps(call, &alignment);
            if covers {
                update_allele_count(call, &alignment, stats);
            }
            // Buffered either way: a later call may need it.
            self.window.append(alignment, stats)?;
            if !covers {
                break;
            }
        }
        Ok(())
    }

    /// Next alignment that is in order and passes the quality filter.
    fn pull_alignment(&mut self, stats: &mut RunStats) -> Result<Option<Alignment>, AnnotateError> {
        while self.more_alignments {
            let Some(alignment) = self.alignments.next_alignment()? else {
                debug!(read = stats.alignments_read, "alignment stream exhausted");
                self.more_alignments = false;
                break;
            };
            stats.record_alignment_read();
            self.alignment_order
                .check(&alignment.chrom, alignment.position, &self.order)?;
            if self.filter.admit(&alignment, stats) {
                return Ok(Some(alignment));
            }
        }
        Ok(None)
    }
}

/// Run the full merge-join: annotate every call from `calls` against
/// `alignments` and hand each to `sink` in input order.
///
/// Returns the aggregated statistics, or the first fatal error. Output
/// already written for earlier calls is left to the sink.
pub fn process<C, A, S, O>(
    calls: &mut C,
    alignments: A,
    sink: &mut S,
    order: O,
    config: &AnnotationConfig,
) -> Result<RunStats, AnnotateError>
where
    C: CallSource + ?Sized,
    A: AlignmentSource,
    S: CallSink + ?Sized,
    O: ChromosomeOrder,
{
    let mut stats = RunStats::new();
    let mut engine = MergeJoinEngine::new(alignments, order, config)?;
    let mut call_order = OrderValidator::new(StreamKind::Calls);
    let mut chromosome_calls = 0u64;
    let mut calls_after_exhaustion = 0u64;

    while let Some(mut call) = calls.next_call()? {
        match call_order.check(&call.chrom, call.position, engine.order())? {
            Advance::NewChromosome(finished) => {
                log_finished_chromosome(&finished, chromosome_calls);
                chromosome_calls = 0;
            }
            Advance::SamePosition => {
                stats.calls_sharing_position += 1;
                debug!(chrom = %call.chrom, position = call.position, "multiple calls at one position");
            }
            Advance::First | Advance::Forward => {}
        }
        chromosome_calls += 1;
        if !engine.has_more_alignments() {
            calls_after_exhaustion += 1;
        }

        engine.annotate(&mut call, &mut stats)?;
        sink.write_call(&call)?;
    }

    if let Some((chrom, _)) = call_order.last() {
        log_finished_chromosome(chrom, chromosome_calls);
    }
    if calls_after_exhaustion > 0 {
        warn!(
            calls = calls_after_exhaustion,
            "alignment stream ended before the call stream; remaining calls use buffered alignments only"
        );
    }
    Ok(stats)
}

fn log_finished_chromosome(chrom: &Arc<str>, calls: u64) {
    info!(chrom = %chrom, calls, "finished chromosome");
}
