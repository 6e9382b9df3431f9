use std::sync::Arc;

/// Classification of the base an alignment carries at a call position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allele {
    /// Matches the first base of REF.
    Reference,
    /// Matches the first base of ALT.
    Alternate,
    /// Anything else, including `N`.
    Other,
}

/// Per-call allele tallies accumulated while scanning overlapping alignments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlleleCounts {
    /// Alignments carrying the reference base at the call position.
    pub ref_count: u32,
    /// Alignments carrying the alternate base at the call position.
    pub alt_count: u32,
    /// Alignments carrying any other base.
    pub other_count: u32,
}

impl AlleleCounts {
    /// Increment the tally for one observed allele.
    pub fn record(&mut self, allele: Allele) {
        match allele {
            Allele::Reference => self.ref_count += 1,
            Allele::Alternate => self.alt_count += 1,
            Allele::Other => self.other_count += 1,
        }
    }

    /// Depth as reported in the `DP` field: reference plus alternate.
    ///
    /// Other bases are excluded to match the haplohseq convention.
    pub fn depth(&self) -> u32 {
        self.ref_count + self.alt_count
    }

    /// Every overlapping alignment, including those with other bases.
    pub fn total(&self) -> u32 {
        self.ref_count + self.alt_count + self.other_count
    }
}

/// A single variant call read from the call stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCall {
    /// Chromosome/contig name.
    pub chrom: Arc<str>,
    /// 1-based position of the call.
    pub position: u64,
    /// VCF ID column (`.` when absent).
    pub id: String,
    /// Reference allele as written in the VCF.
    pub reference: String,
    /// Alternate allele as written in the VCF.
    pub alternate: String,
    /// Allele tallies, filled in by the merge-join engine.
    pub counts: AlleleCounts,
    /// VCF columns following ALT (QUAL, FILTER, INFO, FORMAT, sample),
    /// carried through to the output.
    pub trailing: Vec<String>,
}

impl VariantCall {
    /// Construct a call with zeroed counts and no trailing columns.
    pub fn new(
        chrom: impl Into<Arc<str>>,
        position: u64,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            id: ".".to_string(),
            reference: reference.into(),
            alternate: alternate.into(),
            counts: AlleleCounts::default(),
            trailing: Vec::new(),
        }
    }

    /// First base of the reference allele; multi-base alleles are not split.
    pub fn reference_base(&self) -> Option<u8> {
        self.reference.bytes().next()
    }

    /// First base of the alternate allele.
    pub fn alternate_base(&self) -> Option<u8> {
        self.alternate.bytes().next()
    }
}

/// Aligned sequence read copied out of the alignment stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Reference contig/chromosome name.
    pub chrom: Arc<str>,
    /// 1-based leftmost reference coordinate.
    pub position: u64,
    /// Read sequence as stored in the record.
    pub sequence: Vec<u8>,
    /// Mapping quality (Phred-scaled).
    pub mapq: u8,
}

impl Alignment {
    /// Construct a new alignment.
    pub fn new(
        chrom: impl Into<Arc<str>>,
        position: u64,
        sequence: impl Into<Vec<u8>>,
        mapq: u8,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            sequence: sequence.into(),
            mapq,
        }
    }

    /// Read length inferred from the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the record carries no sequence (`*` in SAM).
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// End position (half-open) on the reference assuming contiguous match.
    pub fn end(&self) -> u64 {
        self.position + self.len() as u64
    }

    /// Base aligned to the given 1-based reference coordinate, if covered.
    pub fn base_at(&self, position: u64) -> Option<u8> {
        let offset = position.checked_sub(self.position)?;
        self.sequence.get(usize::try_from(offset).ok()?).copied()
    }
}

/// Whether two chromosome names are the same, checking pointer identity first.
#[inline]
pub(crate) fn same_chrom(a: &Arc<str>, b: &Arc<str>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_is_half_open() {
        let alignment = Alignment::new("chr1", 95, b"ACGTACGTAC".to_vec(), 30);
        assert_eq!(alignment.end(), 105);
        assert_eq!(alignment.base_at(95), Some(b'A'));
        assert_eq!(alignment.base_at(104), Some(b'C'));
        assert_eq!(alignment.base_at(105), None);
        assert_eq!(alignment.base_at(94), None);
    }

    #[test]
    fn allele_bases_use_first_character() {
        let call = VariantCall::new("chr1", 10, "AT", "GCC");
        assert_eq!(call.reference_base(), Some(b'A'));
        assert_eq!(call.alternate_base(), Some(b'G'));
    }

    #[test]
    fn depth_excludes_other() {
        let counts = AlleleCounts {
            ref_count: 3,
            alt_count: 2,
            other_count: 4,
        };
        assert_eq!(counts.depth(), 5);
        assert_eq!(counts.total(), 9);
    }
}
