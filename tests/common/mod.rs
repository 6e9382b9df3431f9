#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ad2vcf::genomics::{VcfHeader, VcfReader};
use ad2vcf::{Alignment, CallSource, VariantCall};

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("AD2VCF_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set AD2VCF_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path, expected, actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

pub fn aln(chrom: &str, position: u64, sequence: &[u8], mapq: u8) -> Alignment {
    Alignment::new(chrom, position, sequence.to_vec(), mapq)
}

pub fn call(chrom: &str, position: u64, reference: &str, alternate: &str) -> VariantCall {
    VariantCall::new(chrom, position, reference, alternate)
}

/// Parse VCF text held in memory into its header and calls.
pub fn read_vcf(text: &str) -> (VcfHeader, Vec<VariantCall>) {
    let mut reader = VcfReader::new(text.as_bytes()).expect("header parses");
    let header = reader.header().clone();
    let mut calls = Vec::new();
    while let Some(call) = reader.next_call().expect("record parses") {
        calls.push(call);
    }
    (header, calls)
}
