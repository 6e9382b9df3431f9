//! Total orders over chromosome names.
//!
//! Sorted SAM/BAM and VCF files list chromosomes in reference order, which is
//! not lexicographic: `chr2` precedes `chr10`. The merge-join only needs a
//! comparator, so the ordering is a trait and the engine stays agnostic.

use std::cmp::Ordering;

/// Comparator consulted whenever coordinates on different chromosomes meet.
pub trait ChromosomeOrder {
    /// Compare two chromosome names.
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Whether `a` sorts strictly before `b`.
    #[inline]
    fn is_before(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

impl<T: ChromosomeOrder + ?Sized> ChromosomeOrder for &T {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        (**self).compare(a, b)
    }
}

impl<T: ChromosomeOrder + ?Sized> ChromosomeOrder for Box<T> {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        (**self).compare(a, b)
    }
}

/// Conventional genomic ordering.
///
/// With any `chr` prefix removed: numbered chromosomes by value, then `X`,
/// `Y`, `M`/`MT`, then every other contig by natural (digit-aware) order.
/// Names that tie after normalisation (`chr1` vs `1`) fall back to plain
/// string comparison so the order stays total.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalChromosomeOrder;

/// Plain byte-wise ordering, for references sorted with `sort`-style tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicOrder;

impl ChromosomeOrder for LexicographicOrder {
    #[inline]
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

#[derive(Debug, Clone, Copy)]
enum Class<'a> {
    Numbered(&'a [u8]),
    X,
    Y,
    Mito,
    Other(&'a str),
}

impl Class<'_> {
    fn rank(&self) -> u8 {
        match self {
            Class::Numbered(_) => 0,
            Class::X => 1,
            Class::Y => 2,
            Class::Mito => 3,
            Class::Other(_) => 4,
        }
    }
}

fn strip_chr_prefix(name: &str) -> &str {
    match name.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &name[3..],
        _ => name,
    }
}

fn classify(name: &str) -> Class<'_> {
    let stripped = strip_chr_prefix(name);
    if !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_digit()) {
        return Class::Numbered(stripped.as_bytes());
    }
    match stripped {
        "X" | "x" => Class::X,
        "Y" | "y" => Class::Y,
        "M" | "m" | "MT" | "Mt" | "mt" => Class::Mito,
        _ => Class::Other(stripped),
    }
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&d| d == b'0').count();
    &digits[zeros..]
}

/// Compare two runs of ASCII digits by numeric value without parsing.
fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let a = trim_leading_zeros(a);
    let b = trim_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let n = s.iter().take_while(|b| b.is_ascii_digit()).count();
    s.split_at(n)
}

/// Digit-aware comparison: `scaffold9` < `scaffold10`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.as_bytes();
    let mut b = b.as_bytes();
    loop {
        match (a.first(), b.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let (run_a, rest_a) = split_digits(a);
                let (run_b, rest_b) = split_digits(b);
                let ord = cmp_digit_runs(run_a, run_b);
                if ord != Ordering::Equal {
                    return ord;
                }
                a = rest_a;
                b = rest_b;
            }
            (Some(x), Some(y)) => {
                let ord = x.cmp(y);
                if ord != Ordering::Equal {
                    return ord;
                }
                a = &a[1..];
                b = &b[1..];
            }
        }
    }
}

impl ChromosomeOrder for NaturalChromosomeOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let (class_a, class_b) = (classify(a), classify(b));
        let ord = match (class_a, class_b) {
            (Class::Numbered(x), Class::Numbered(y)) => cmp_digit_runs(x, y),
            (Class::Other(x), Class::Other(y)) => natural_cmp(x, y),
            _ => class_a.rank().cmp(&class_b.rank()),
        };
        ord.then_with(|| a.cmp(b))
    }
}
