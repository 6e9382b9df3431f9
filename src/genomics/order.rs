//! Stream order validation.

use std::sync::Arc;

use crate::genomics::types::same_chrom;
use crate::genomics::ChromosomeOrder;
use crate::{AnnotateError, StreamKind};

/// How a record relates to the one before it in its stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// First record of the stream.
    First,
    /// Same chromosome and position as the previous record.
    SamePosition,
    /// Same chromosome, later position.
    Forward,
    /// Moved on to a later chromosome; carries the one just finished.
    NewChromosome(Arc<str>),
}

/// Checks that one stream arrives in non-decreasing (chromosome, position)
/// order.
///
/// Calls and alignments each get their own validator.
#[derive(Debug, Clone)]
pub struct OrderValidator {
    stream: StreamKind,
    last: Option<(Arc<str>, u64)>,
}

impl OrderValidator {
    /// Validator for the given stream with nothing seen yet.
    pub fn new(stream: StreamKind) -> Self {
        Self { stream, last: None }
    }

    /// Stream this validator guards.
    pub fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Last coordinate accepted.
    pub fn last(&self) -> Option<(&Arc<str>, u64)> {
        self.last.as_ref().map(|(chrom, pos)| (chrom, *pos))
    }

    /// Accept the next coordinate or report an ordering violation.
    ///
    /// Equal coordinates are ties, not violations.
    pub fn check<O: ChromosomeOrder + ?Sized>(
        &mut self,
        chrom: &Arc<str>,
        position: u64,
        order: &O,
    ) -> Result<Advance, AnnotateError> {
        let Some((last_chrom, last_pos)) = self.last.as_mut() else {
            self.last = Some((Arc::clone(chrom), position));
            return Ok(Advance::First);
        };

        if same_chrom(chrom, last_chrom) {
            if position < *last_pos {
                return Err(self.violation(chrom, position));
            }
            let advance = if position == *last_pos {
                Advance::SamePosition
            } else {
                Advance::Forward
            };
            *last_pos = position;
            return Ok(advance);
        }

        if order.is_before(chrom, last_chrom) {
            return Err(self.violation(chrom, position));
        }
        let finished = std::mem::replace(last_chrom, Arc::clone(chrom));
        *last_pos = position;
        Ok(Advance::NewChromosome(finished))
    }

    fn violation(&self, chrom: &str, position: u64) -> AnnotateError {
        let (previous_chromosome, previous_position) = self
            .last
            .as_ref()
            .map(|(c, p)| (c.to_string(), *p))
            .unwrap_or_default();
        AnnotateError::OrderingViolation {
            stream: self.stream,
            chromosome: chrom.to_string(),
            position,
            previous_chromosome,
            previous_position,
        }
    }
}
