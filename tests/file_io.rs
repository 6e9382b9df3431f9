use std::fs;
use std::io::Write;
use std::path::Path;

use ad2vcf::genomics::{
    annotated_output_path, create_output, open_calls, render_vcf, SamReader, VcfWriter,
};
use ad2vcf::{
    process, AlignmentSource, AnnotateError, AnnotationConfig, CallSource,
    NaturalChromosomeOrder, VariantCall,
};
use tempfile::tempdir;

const SAM: &str = "@HD\tVN:1.6\tSO:coordinate
@SQ\tSN:chr1\tLN:1000
@SQ\tSN:chr2\tLN:1000
r1\t0\tchr1\t90\t5\t4M\t*\t0\t0\tGGGG\t*
r2\t0\tchr1\t95\t30\t10M\t*\t0\t0\tAAAAAAAAAA\t*
r3\t0\tchr1\t98\t30\t10M\t*\t0\t0\tCCCCCCCCCC\t*
u1\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\t*
";

const VCF: &str = "##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE1
chr1\t100\t.\tA\tT\t.\tPASS\t.\tGT\t0/1
";

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write fixture");
}

#[test]
fn sam_records_become_alignments() {
    let dir = tempdir().expect("temp dir");
    let sam = dir.path().join("reads.sam");
    write_file(&sam, SAM);

    let mut reader = SamReader::from_path(&sam).expect("SAM opens");
    assert_eq!(
        reader.chromosomes().iter().map(|c| &**c).collect::<Vec<_>>(),
        vec!["chr1", "chr2"]
    );

    let first = reader.next_alignment().unwrap().expect("first record");
    assert_eq!(&*first.chrom, "chr1");
    assert_eq!(first.position, 90);
    assert_eq!(first.sequence, b"GGGG".to_vec());
    assert_eq!(first.mapq, 5);

    let mut rest = Vec::new();
    while let Some(alignment) = reader.next_alignment().unwrap() {
        rest.push(alignment.position);
    }
    assert_eq!(rest, vec![95, 98]);
    assert_eq!(reader.unmapped_skipped(), 1);
}

#[test]
fn files_on_disk_annotate_end_to_end() {
    let dir = tempdir().expect("temp dir");
    let sam = dir.path().join("reads.sam");
    let vcf = dir.path().join("calls.vcf");
    write_file(&sam, SAM);
    write_file(&vcf, VCF);

    let mut calls = open_calls(&vcf).expect("VCF opens");
    let mut writer = VcfWriter::new(Vec::new(), calls.header()).expect("header written");
    let stats = process(
        &mut calls,
        SamReader::from_path(&sam).expect("SAM opens"),
        &mut writer,
        NaturalChromosomeOrder,
        &AnnotationConfig::default(),
    )
    .expect("annotation succeeds");
    let output = String::from_utf8(writer.finish().expect("flush")).expect("utf-8");

    assert_eq!(stats.alignments_discarded, 1);
    assert_eq!(
        output.lines().last(),
        Some("chr1\t100\t.\tA\tT\t.\tPASS\t.\tGT:AD:DP\t0/1:1,0:1")
    );
}

#[test]
fn compressed_output_reads_back() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("calls.vcf");
    write_file(&input, VCF);
    let (header, calls) = {
        let mut reader = open_calls(&input).expect("VCF opens");
        let header = reader.header().clone();
        let mut calls = Vec::new();
        while let Some(call) = reader.next_call().expect("record parses") {
            calls.push(call);
        }
        (header, calls)
    };

    let output = dir.path().join("calls.vcf.gz");
    let expected = render_vcf(&header, &calls).expect("render");
    {
        let mut sink = create_output(&output).expect("BGZF output created");
        sink.write_all(expected.as_bytes()).expect("write");
        sink.flush().expect("flush");
    }

    let mut reread = open_calls(&output).expect("BGZF input opens");
    assert_eq!(reread.header().sample(), Some("SAMPLE1"));
    let call = reread.next_call().unwrap().expect("one record");
    assert_eq!(call.position, 100);
    assert_eq!(call.trailing.last().map(String::as_str), Some("0/1:0,0:0"));
    assert!(reread.next_call().unwrap().is_none());
}

#[test]
fn derived_output_sits_next_to_input() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("NA12878.chr1.vcf.gz");
    assert_eq!(
        annotated_output_path(&input).unwrap(),
        dir.path().join("NA12878.chr1-ad.vcf.gz")
    );
}

#[test]
fn corrupt_record_mid_stream_is_a_data_error() {
    let dir = tempdir().expect("temp dir");
    let sam = dir.path().join("reads.sam");
    let vcf = dir.path().join("calls.vcf");
    write_file(
        &sam,
        "@HD\tVN:1.6\tSO:coordinate
@SQ\tSN:chr1\tLN:1000
r1\t0\tchr1\t90\t30\t10M\t*\t0\t0\tAAAAAAAAAA\t*
r2\t0\tchr1\tNOTANUMBER\t30\t10M\t*\t0\t0\tAAAAAAAAAA\t*
",
    );
    write_file(&vcf, VCF);

    let mut reader = SamReader::from_path(&sam).expect("SAM opens");
    assert_eq!(reader.next_alignment().unwrap().map(|a| a.position), Some(90));
    let err = reader.next_alignment().unwrap_err();
    assert!(matches!(err, AnnotateError::AlignmentRecord { record: 2, .. }));
    assert_eq!(err.exit_code(), 65);

    let mut calls = open_calls(&vcf).expect("VCF opens");
    let mut out: Vec<VariantCall> = Vec::new();
    let err = process(
        &mut calls,
        SamReader::from_path(&sam).expect("SAM opens"),
        &mut out,
        NaturalChromosomeOrder,
        &AnnotationConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 65);
    assert!(out.is_empty());
}

#[test]
fn missing_alignment_file_is_reported() {
    let dir = tempdir().expect("temp dir");
    assert!(SamReader::from_path(dir.path().join("absent.bam")).is_err());
}
