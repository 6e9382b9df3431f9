//! In-flight alignment window.
//!
//! Alignments are buffered here once read from the stream until they are
//! proven upstream of every remaining call. The backing storage grows
//! geometrically and stops at a hard ceiling: a window that wants to grow
//! past it means pathological coverage or unsorted input, and the run is
//! aborted instead of buffering without limit.

use std::slice;

use tracing::debug;

use crate::genomics::engine::{overlaps, precedes};
use crate::genomics::{Alignment, ChromosomeOrder, RunStats, VariantCall};
use crate::AnnotateError;

/// Default number of slots allocated up front.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;
/// Default multiplier applied when the window is full.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;
/// Default hard ceiling on buffered alignments.
pub const DEFAULT_MAX_CAPACITY: usize = 32_768;

/// Growth policy for [`AlignmentWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Slots allocated when the window is created.
    pub initial_capacity: usize,
    /// Capacity multiplier on exhaustion.
    pub growth_factor: usize,
    /// Largest number of alignments the window may hold.
    pub max_capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl WindowConfig {
    /// Set the starting capacity.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Set the growth multiplier.
    pub fn with_growth_factor(mut self, growth_factor: usize) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Set the hard ceiling. A starting capacity above it is clamped.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self.initial_capacity = self.initial_capacity.min(max_capacity);
        self
    }

    /// Reject policies that cannot make progress.
    pub fn validate(&self) -> Result<(), AnnotateError> {
        if self.initial_capacity == 0 {
            return Err(AnnotateError::InvalidConfiguration(
                "initial window capacity must be > 0".to_string(),
            ));
        }
        if self.growth_factor < 2 {
            return Err(AnnotateError::InvalidConfiguration(format!(
                "window growth factor must be >= 2, got {}",
                self.growth_factor
            )));
        }
        if self.initial_capacity > self.max_capacity {
            return Err(AnnotateError::InvalidConfiguration(format!(
                "initial window capacity {} exceeds maximum {}",
                self.initial_capacity, self.max_capacity
            )));
        }
        Ok(())
    }
}

/// FIFO of buffered alignments in stream order.
#[derive(Debug)]
pub struct AlignmentWindow {
    alignments: Vec<Alignment>,
    capacity: usize,
    config: WindowConfig,
    max_count: usize,
}

impl AlignmentWindow {
    /// Empty window allocated to the configured starting capacity.
    pub fn new(config: WindowConfig) -> Self {
        Self {
            alignments: Vec::with_capacity(config.initial_capacity),
            capacity: config.initial_capacity,
            config,
            max_count: 0,
        }
    }

    /// Number of buffered alignments.
    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }

    /// Current capacity; at most the configured ceiling.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most alignments ever held at once.
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Buffered alignments, oldest first.
    pub fn as_slice(&self) -> &[Alignment] {
        &self.alignments
    }

    /// Iterate buffered alignments, oldest first.
    pub fn iter(&self) -> slice::Iter<'_, Alignment> {
        self.alignments.iter()
    }

    /// Move an alignment into the next free slot, growing if full.
    pub fn append(&mut self, alignment: Alignment, stats: &mut RunStats) -> Result<(), AnnotateError> {
        if self.alignments.len() == self.capacity {
            self.grow(&alignment, stats)?;
        }
        self.alignments.push(alignment);
        self.max_count = self.max_count.max(self.alignments.len());
        stats.record_window_len(self.alignments.len());
        Ok(())
    }

    fn grow(&mut self, pending: &Alignment, stats: &mut RunStats) -> Result<(), AnnotateError> {
        if self.capacity >= self.config.max_capacity {
            return Err(AnnotateError::CapacityExceeded {
                max_capacity: self.config.max_capacity,
                chromosome: pending.chrom.to_string(),
                position: pending.position,
            });
        }
        let new_capacity = self
            .capacity
            .saturating_mul(self.config.growth_factor)
            .min(self.config.max_capacity);
        debug!(
            from = self.capacity,
            to = new_capacity,
            chrom = %pending.chrom,
            position = pending.position,
            "growing alignment window"
        );
        self.alignments
            .reserve_exact(new_capacity - self.alignments.len());
        self.capacity = new_capacity;
        stats.record_window_growth();
        Ok(())
    }

    /// Drop the `k` oldest alignments, keeping the rest in order.
    pub fn evict_prefix(&mut self, k: usize) {
        debug_assert!(k <= self.alignments.len());
        let k = k.min(self.alignments.len());
        if k > 0 {
            self.alignments.drain(..k);
        }
    }

    /// Count of leading alignments covering the call position.
    pub fn overlapping_prefix_length(&self, call: &VariantCall) -> usize {
        self.alignments
            .iter()
            .take_while(|alignment| overlaps(call, alignment))
            .count()
    }

    /// Count of leading alignments lying entirely upstream of the call.
    pub fn preceding_prefix_length<O: ChromosomeOrder + ?Sized>(
        &self,
        call: &VariantCall,
        order: &O,
    ) -> usize {
        self.alignments
            .iter()
            .take_while(|alignment| precedes(alignment, call, order))
            .count()
    }

    /// Evict every alignment upstream of the call; returns how many went.
    ///
    /// The upstream run at the front goes in one block. Shorter reads that
    /// started after a still-overlapping longer read can end upstream too,
    /// so survivors are swept once more.
    pub fn evict_preceding<O: ChromosomeOrder + ?Sized>(
        &mut self,
        call: &VariantCall,
        order: &O,
    ) -> usize {
        let prefix = self.preceding_prefix_length(call, order);
        self.evict_prefix(prefix);
        let before = self.alignments.len();
        self.alignments
            .retain(|alignment| !precedes(alignment, call, order));
        prefix + before - self.alignments.len()
    }
}

impl<'a> IntoIterator for &'a AlignmentWindow {
    type Item = &'a Alignment;
    type IntoIter = slice::Iter<'a, Alignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::NaturalChromosomeOrder;

    fn read(pos: u64, len: usize) -> Alignment {
        Alignment::new("chr1", pos, vec![b'A'; len], 60)
    }

    fn small(initial: usize, max: usize) -> WindowConfig {
        WindowConfig::default()
            .with_max_capacity(max)
            .with_initial_capacity(initial)
    }

    #[test]
    fn grows_geometrically_up_to_ceiling() {
        let mut window = AlignmentWindow::new(small(2, 5));
        let mut stats = RunStats::new();
        for pos in 0..5 {
            window.append(read(pos, 10), &mut stats).unwrap();
        }
        assert_eq!(window.capacity(), 5);
        assert_eq!(window.max_count(), 5);
        assert_eq!(stats.window_growths, 2);
        assert_eq!(stats.window_high_water, 5);

        let err = window.append(read(6, 10), &mut stats).unwrap_err();
        assert!(matches!(
            err,
            AnnotateError::CapacityExceeded { max_capacity: 5, position: 6, .. }
        ));
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn evict_prefix_preserves_order() {
        let mut window = AlignmentWindow::new(WindowConfig::default());
        let mut stats = RunStats::new();
        for pos in [10, 20, 30, 40] {
            window.append(read(pos, 5), &mut stats).unwrap();
        }
        window.evict_prefix(0);
        assert_eq!(window.len(), 4);
        window.evict_prefix(2);
        let left: Vec<u64> = window.iter().map(|a| a.position).collect();
        assert_eq!(left, vec![30, 40]);
        assert_eq!(window.max_count(), 4);
    }

    #[test]
    fn prefix_lengths_follow_predicates() {
        let mut window = AlignmentWindow::new(WindowConfig::default());
        let mut stats = RunStats::new();
        // [90,95) [92,102) [99,109) [101,111)
        for (pos, len) in [(90, 5), (92, 10), (99, 10), (101, 10)] {
            window.append(read(pos, len), &mut stats).unwrap();
        }
        let call = VariantCall::new("chr1", 100, "A", "T");
        assert_eq!(window.preceding_prefix_length(&call, &NaturalChromosomeOrder), 1);
        assert_eq!(window.overlapping_prefix_length(&call), 0);
        window.evict_prefix(1);
        assert_eq!(window.overlapping_prefix_length(&call), 2);
    }

    #[test]
    fn evict_preceding_sweeps_interior_stragglers() {
        let mut window = AlignmentWindow::new(WindowConfig::default());
        let mut stats = RunStats::new();
        // long read still covering 100, short read ending at 95, another covering read
        for (pos, len) in [(80, 5), (90, 20), (92, 3), (95, 10), (120, 4)] {
            window.append(read(pos, len), &mut stats).unwrap();
        }
        let call = VariantCall::new("chr1", 100, "A", "T");
        assert_eq!(window.evict_preceding(&call, &NaturalChromosomeOrder), 2);
        let left: Vec<u64> = window.iter().map(|a| a.position).collect();
        assert_eq!(left, vec![90, 95, 120]);
        assert_eq!(window.overlapping_prefix_length(&call), 2);
    }

    #[test]
    fn rejects_unusable_configuration() {
        assert!(WindowConfig::default().with_growth_factor(1).validate().is_err());
        assert!(WindowConfig::default().with_initial_capacity(0).validate().is_err());
        let inverted = WindowConfig {
            initial_capacity: 64,
            growth_factor: 2,
            max_capacity: 8,
        };
        assert!(inverted.validate().is_err());
    }
}
