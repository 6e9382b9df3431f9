//! Merge-join throughput on synthetic deep coverage.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ad2vcf::{process, Alignment, AnnotationConfig, NaturalChromosomeOrder, RunStats, VariantCall};

const READ_LEN: usize = 150;

/// `depth` reads start at every `stride`-th base; one call every 100 bases.
fn synthetic(span: u64, stride: u64, depth: usize) -> (Vec<VariantCall>, Vec<Alignment>) {
    let sequence: Vec<u8> = b"ACGT".iter().copied().cycle().take(READ_LEN).collect();
    let mut alignments = Vec::new();
    let mut pos = 1;
    while pos <= span {
        for copy in 0..depth {
            alignments.push(Alignment::new("chr1", pos, sequence.clone(), 20 + (copy % 40) as u8));
        }
        pos += stride;
    }
    let calls = (1..span / 100)
        .map(|i| VariantCall::new("chr1", i * 100, "A", "C"))
        .collect();
    (calls, alignments)
}

fn run(calls: &[VariantCall], alignments: &[Alignment]) -> RunStats {
    let mut out: Vec<VariantCall> = Vec::with_capacity(calls.len());
    process(
        &mut calls.to_vec().into_iter(),
        alignments.to_vec().into_iter(),
        &mut out,
        NaturalChromosomeOrder,
        &AnnotationConfig::default(),
    )
    .expect("synthetic input is sorted")
}

fn benchmark_merge_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_join");
    for depth in [4usize, 16] {
        let (calls, alignments) = synthetic(100_000, 10, depth);
        group.throughput(Throughput::Elements(alignments.len() as u64));
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, _| {
            b.iter(|| black_box(run(&calls, &alignments)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_merge_join);
criterion_main!(benches);
