use tracing::info;

use crate::genomics::{Allele, AlleleCounts};

/// Run-wide counters gathered while the merge-join advances.
///
/// Created once per run, updated after every call and alignment event, and
/// read back by the caller of [`process`](crate::process) for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Calls annotated and emitted.
    pub calls: u64,
    /// Calls at the same (chromosome, position) as the call before them.
    pub calls_sharing_position: u64,
    /// Alignments pulled from the alignment stream.
    pub alignments_read: u64,
    /// Alignments rejected by the mapping-quality filter.
    pub alignments_discarded: u64,
    /// Lowest MAPQ among discarded alignments.
    pub discarded_mapq_min: Option<u8>,
    /// Highest MAPQ among discarded alignments.
    pub discarded_mapq_max: Option<u8>,
    /// Sum of MAPQ over discarded alignments.
    pub discarded_mapq_sum: u64,
    /// Admitted alignments dropped without buffering because they end
    /// before the call being processed.
    pub alignments_skipped: u64,
    /// Most alignments held in the window at once.
    pub window_high_water: usize,
    /// Number of times the window had to grow.
    pub window_growths: u64,
    /// Reference bases observed over all calls.
    pub ref_total: u64,
    /// Alternate bases observed over all calls.
    pub alt_total: u64,
    /// Other bases observed over all calls.
    pub other_total: u64,
    /// Smallest per-call depth (ref + alt).
    pub min_depth: Option<u32>,
    /// Largest per-call depth (ref + alt).
    pub max_depth: Option<u32>,
    /// Sum of per-call depths.
    pub depth_sum: u64,
}

impl RunStats {
    /// Fresh, zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_alignment_read(&mut self) {
        self.alignments_read += 1;
    }

    pub(crate) fn record_discard(&mut self, mapq: u8) {
        self.alignments_discarded += 1;
        self.discarded_mapq_sum += u64::from(mapq);
        self.discarded_mapq_min = Some(self.discarded_mapq_min.map_or(mapq, |m| m.min(mapq)));
        self.discarded_mapq_max = Some(self.discarded_mapq_max.map_or(mapq, |m| m.max(mapq)));
    }

    pub(crate) fn record_skip(&mut self) {
        self.alignments_skipped += 1;
    }

    pub(crate) fn record_window_len(&mut self, len: usize) {
        self.window_high_water = self.window_high_water.max(len);
    }

    pub(crate) fn record_window_growth(&mut self) {
        self.window_growths += 1;
    }

    pub(crate) fn record_allele(&mut self, allele: Allele) {
        match allele {
            Allele::Reference => self.ref_total += 1,
            Allele::Alternate => self.alt_total += 1,
            Allele::Other => self.other_total += 1,
        }
    }

    pub(crate) fn record_call(&mut self, counts: &AlleleCounts) {
        let depth = counts.depth();
        self.calls += 1;
        self.depth_sum += u64::from(depth);
        self.min_depth = Some(self.min_depth.map_or(depth, |d| d.min(depth)));
        self.max_depth = Some(self.max_depth.map_or(depth, |d| d.max(depth)));
    }

    /// Mean depth over all calls, if any were processed.
    pub fn mean_depth(&self) -> Option<f64> {
        (self.calls > 0).then(|| self.depth_sum as f64 / self.calls as f64)
    }

    /// Mean MAPQ over discarded alignments, if any were discarded.
    pub fn mean_discarded_mapq(&self) -> Option<f64> {
        (self.alignments_discarded > 0)
            .then(|| self.discarded_mapq_sum as f64 / self.alignments_discarded as f64)
    }

    /// Emit the end-of-run report through `tracing`.
    pub fn log_summary(&self) {
        info!(
            calls = self.calls,
            sharing_position = self.calls_sharing_position,
            "calls processed"
        );
        info!(
            read = self.alignments_read,
            discarded = self.alignments_discarded,
            skipped = self.alignments_skipped,
            "alignments processed"
        );
        if let (Some(min), Some(max), Some(mean)) = (
            self.discarded_mapq_min,
            self.discarded_mapq_max,
            self.mean_discarded_mapq(),
        ) {
            info!(min, max, mean = %format!("{mean:.2}"), "MAPQ of discarded alignments");
        }
        info!(
            high_water = self.window_high_water,
            growths = self.window_growths,
            "alignment window"
        );
        info!(
            reference = self.ref_total,
            alternate = self.alt_total,
            other = self.other_total,
            "alleles observed"
        );
        if let (Some(min), Some(max), Some(mean)) =
            (self.min_depth, self.max_depth, self.mean_depth())
        {
            info!(min, max, mean = %format!("{mean:.2}"), "depth (ref + alt)");
        }
    }
}
