//! Mapping-quality admission.

use crate::genomics::{Alignment, RunStats};

/// SAM sentinel for a missing mapping quality.
pub const MAPQ_UNAVAILABLE: u8 = 255;

/// Mapping-quality admission policy applied before an alignment can enter
/// the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityFilter {
    min_mapq: u8,
}

impl QualityFilter {
    /// Admit alignments whose MAPQ is at least `min_mapq` and is known.
    pub fn new(min_mapq: u8) -> Self {
        Self { min_mapq }
    }

    /// Configured threshold.
    pub fn min_mapq(&self) -> u8 {
        self.min_mapq
    }

    /// Whether the alignment may be buffered and counted.
    ///
    /// Rejections are tallied in `stats` and never surface as errors.
    #[inline]
    pub fn admit(&self, alignment: &Alignment, stats: &mut RunStats) -> bool {
        // 255 means mapping quality is not available
        if alignment.mapq == MAPQ_UNAVAILABLE || alignment.mapq < self.min_mapq {
            stats.record_discard(alignment.mapq);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_mapq(mapq: u8) -> Alignment {
        Alignment::new("chr1", 1, b"ACGT".to_vec(), mapq)
    }

    #[test]
    fn rejects_below_threshold() {
        let filter = QualityFilter::new(10);
        let mut stats = RunStats::new();
        for mapq in [0, 5, 9] {
            assert!(!filter.admit(&with_mapq(mapq), &mut stats));
        }
        for mapq in [10, 30, 254] {
            assert!(filter.admit(&with_mapq(mapq), &mut stats));
        }
        assert_eq!(stats.alignments_discarded, 3);
        assert_eq!(stats.discarded_mapq_min, Some(0));
        assert_eq!(stats.discarded_mapq_max, Some(9));
        assert_eq!(stats.discarded_mapq_sum, 14);
    }

    #[test]
    fn unavailable_mapq_is_rejected() {
        let mut stats = RunStats::new();
        for threshold in [0, 10, 60] {
            let filter = QualityFilter::new(threshold);
            assert!(!filter.admit(&with_mapq(MAPQ_UNAVAILABLE), &mut stats));
        }
        assert_eq!(stats.alignments_discarded, 3);
        assert_eq!(stats.discarded_mapq_max, Some(255));
    }

    #[test]
    fn zero_threshold_admits_everything() {
        let filter = QualityFilter::new(0);
        let mut stats = RunStats::new();
        assert!(filter.admit(&with_mapq(0), &mut stats));
        assert_eq!(stats.alignments_discarded, 0);
    }
}
