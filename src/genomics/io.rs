//! Alignment input through htslib and file plumbing for calls and output.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rust_htslib::bam::{self, Read as _};
use rust_htslib::bgzf;

use crate::genomics::{Alignment, AlignmentSource, VcfReader};
use crate::AnnotateError;

/// Alignment stream over SAM, BAM or CRAM via htslib.
///
/// One `bam::Record` is reused for every read; each mapped record is copied
/// into an owned [`Alignment`] before the next read overwrites it.
pub struct SamReader {
    reader: bam::Reader,
    record: bam::Record,
    chromosomes: Vec<Arc<str>>,
    records: u64,
    unmapped: u64,
}

impl fmt::Debug for SamReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamReader")
            .field("targets", &self.chromosomes.len())
            .field("records", &self.records)
            .field("unmapped", &self.unmapped)
            .finish()
    }
}

impl SamReader {
    /// Open a SAM/BAM/CRAM file; the format is detected from its content.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AnnotateError> {
        Ok(Self::with_reader(bam::Reader::from_path(path)?))
    }

    /// Read alignments from standard input.
    pub fn from_stdin() -> Result<Self, AnnotateError> {
        Ok(Self::with_reader(bam::Reader::from_stdin()?))
    }

    fn with_reader(reader: bam::Reader) -> Self {
        let header = reader.header();
        let chromosomes: Vec<Arc<str>> = (0..header.target_count())
            .map(|tid| Arc::from(&*String::from_utf8_lossy(header.tid2name(tid))))
            .collect();
        Self {
            reader,
            record: bam::Record::new(),
            chromosomes,
            records: 0,
            unmapped: 0,
        }
    }

    /// Reference names from the header, in target-id order.
    pub fn chromosomes(&self) -> &[Arc<str>] {
        &self.chromosomes
    }

    /// Unmapped records passed over so far.
    pub fn unmapped_skipped(&self) -> u64 {
        self.unmapped
    }
}

impl AlignmentSource for SamReader {
    fn next_alignment(&mut self) -> Result<Option<Alignment>, AnnotateError> {
        loop {
            match self.reader.read(&mut self.record) {
                None => return Ok(None),
                Some(result) => {
                    self.records += 1;
                    result.map_err(|source| AnnotateError::AlignmentRecord {
                        record: self.records,
                        source,
                    })?
                }
            }
            let tid = self.record.tid();
            if self.record.is_unmapped() || tid < 0 {
                self.unmapped += 1;
                continue;
            }
            let chrom = self
                .chromosomes
                .get(tid as usize)
                .cloned()
                .ok_or_else(|| {
                    AnnotateError::UnsupportedInput(format!(
                        "alignment refers to target id {tid} missing from the header"
                    ))
                })?;
            return Ok(Some(Alignment {
                chrom,
                position: self.record.pos() as u64 + 1,
                sequence: self.record.seq().as_bytes(),
                mapq: self.record.mapq(),
            }));
        }
    }
}

/// Whether a path names BGZF/gzip-compressed content.
pub fn is_compressed(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("gz" | "bgz")
    )
}

/// Open a VCF for reading, decompressing `.gz`/`.bgz` transparently.
pub fn open_calls(path: &Path) -> Result<VcfReader<Box<dyn BufRead>>, AnnotateError> {
    let inner: Box<dyn BufRead> = if is_compressed(path) {
        Box::new(BufReader::new(bgzf::Reader::from_path(path)?))
    } else {
        let file = File::open(path).map_err(|source| AnnotateError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Box::new(BufReader::new(file))
    };
    VcfReader::new(inner)
}

/// Output path for an input VCF: `-ad` goes before the first `.vcf`, so
/// `sample.vcf.gz` becomes `sample-ad.vcf.gz`.
pub fn annotated_output_path(input: &Path) -> Result<PathBuf, AnnotateError> {
    let name = input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AnnotateError::InvalidOutputName(input.to_path_buf()))?;
    let ext = name
        .find(".vcf")
        .ok_or_else(|| AnnotateError::InvalidOutputName(input.to_path_buf()))?;
    let renamed = format!("{}-ad{}", &name[..ext], &name[ext..]);
    Ok(input.with_file_name(renamed))
}

/// Create the output stream: `-` is stdout, compressed names are written
/// as BGZF, anything else as plain text.
pub fn create_output(path: &Path) -> Result<Box<dyn Write>, AnnotateError> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    if is_compressed(path) {
        let writer = bgzf::Writer::from_path(path).map_err(|err| AnnotateError::Create {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, err.to_string()),
        })?;
        return Ok(Box::new(writer));
    }
    let file = File::create(path).map_err(|source| AnnotateError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufWriter::new(file)))
}
