//! Single-sample VCF text: reading calls and writing them back with `AD`
//! and `DP` appended to the sample.

use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::genomics::{CallSink, CallSource, VariantCall};
use crate::AnnotateError;

const AD_FORMAT_LINE: &str = "##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Allelic depths for the ref and alt alleles in the order listed\">";
const DP_FORMAT_LINE: &str =
    "##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth: sum of ref and alt allelic depths\">";
const FIXED_COLUMNS: [&str; 8] = ["#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];

/// Meta lines and column header of a VCF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcfHeader {
    /// `##` lines, without line terminators.
    pub meta: Vec<String>,
    /// Column names from the `#CHROM` line.
    pub columns: Vec<String>,
}

impl VcfHeader {
    /// Name of the single sample column, if present.
    pub fn sample(&self) -> Option<&str> {
        self.columns.get(9).map(String::as_str)
    }
}

fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Streaming reader yielding one [`VariantCall`] per data line.
#[derive(Debug)]
pub struct VcfReader<R> {
    inner: R,
    header: VcfHeader,
    line: String,
    line_no: usize,
    chrom: Option<Arc<str>>,
}

impl<R: BufRead> VcfReader<R> {
    /// Consume the header from `inner`; data lines are read on demand.
    pub fn new(mut inner: R) -> Result<Self, AnnotateError> {
        let mut header = VcfHeader::default();
        let mut line = String::new();
        let mut line_no = 0;

        loop {
            line.clear();
            if inner.read_line(&mut line)? == 0 {
                return Err(AnnotateError::Parse {
                    line: line_no,
                    message: "no #CHROM header found".to_string(),
                });
            }
            line_no += 1;
            let text = trim_line_end(&line);
            if text.starts_with("##") {
                header.meta.push(text.to_string());
            } else if text.starts_with("#CHROM") {
                header.columns = text.split('\t').map(str::to_string).collect();
                break;
            } else {
                return Err(AnnotateError::Parse {
                    line: line_no,
                    message: "expected #CHROM header before data lines".to_string(),
                });
            }
        }

        if header.columns.len() < FIXED_COLUMNS.len() {
            return Err(AnnotateError::Parse {
                line: line_no,
                message: format!(
                    "header has {} columns, expected at least {}",
                    header.columns.len(),
                    FIXED_COLUMNS.len()
                ),
            });
        }
        if header.columns.len() > 10 {
            return Err(AnnotateError::UnsupportedInput(format!(
                "multi-sample VCF with {} samples; only single-sample input is annotated",
                header.columns.len() - 9
            )));
        }

        Ok(Self {
            inner,
            header,
            line,
            line_no,
            chrom: None,
        })
    }

    /// Header read at construction.
    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    fn parse_error(&self, message: impl Into<String>) -> AnnotateError {
        AnnotateError::Parse {
            line: self.line_no,
            message: message.into(),
        }
    }

    fn parse_record(&mut self, text: &str) -> Result<VariantCall, AnnotateError> {
        let columns: Vec<&str> = text.splitn(6, '\t').collect();
        if columns.len() < 5 {
            return Err(self.parse_error(format!(
                "expected at least 5 columns, found {}",
                columns.len()
            )));
        }
        let position: u64 = columns[1]
            .parse()
            .map_err(|_| self.parse_error(format!("invalid call position: {}", columns[1])))?;
        let trailing = columns
            .get(5)
            .map(|rest| rest.split('\t').map(str::to_string).collect())
            .unwrap_or_default();

        Ok(VariantCall {
            chrom: self.intern_chrom(columns[0]),
            position,
            id: columns[2].to_string(),
            reference: columns[3].to_string(),
            alternate: columns[4].to_string(),
            counts: Default::default(),
            trailing,
        })
    }

    /// Reuse the previous record's chromosome name when it repeats.
    fn intern_chrom(&mut self, name: &str) -> Arc<str> {
        match &self.chrom {
            Some(chrom) if &**chrom == name => Arc::clone(chrom),
            _ => {
                let chrom: Arc<str> = Arc::from(name);
                self.chrom = Some(Arc::clone(&chrom));
                chrom
            }
        }
    }
}

impl<R: BufRead> CallSource for VcfReader<R> {
    fn next_call(&mut self) -> Result<Option<VariantCall>, AnnotateError> {
        loop {
            self.line.clear();
            if self.inner.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !trim_line_end(&self.line).is_empty() {
                break;
            }
        }

        let line = std::mem::take(&mut self.line);
        let parsed = self.parse_record(trim_line_end(&line));
        self.line = line;
        parsed.map(Some)
    }
}

/// Writes annotated calls as VCF text.
#[derive(Debug)]
pub struct VcfWriter<W: Write> {
    inner: W,
    line: String,
}

impl<W: Write> VcfWriter<W> {
    /// Write the header, adding `AD`/`DP` definitions and a sample column
    /// when the input lacks them.
    pub fn new(mut inner: W, header: &VcfHeader) -> Result<Self, AnnotateError> {
        let mut has_ad = false;
        let mut has_dp = false;
        for meta in &header.meta {
            has_ad |= meta.starts_with("##FORMAT=<ID=AD,");
            has_dp |= meta.starts_with("##FORMAT=<ID=DP,");
            writeln!(inner, "{meta}")?;
        }
        if !has_ad {
            writeln!(inner, "{AD_FORMAT_LINE}")?;
        }
        if !has_dp {
            writeln!(inner, "{DP_FORMAT_LINE}")?;
        }

        let mut columns: Vec<&str> = header.columns.iter().map(String::as_str).collect();
        if columns.len() < FIXED_COLUMNS.len() {
            columns = FIXED_COLUMNS.to_vec();
        }
        if columns.len() < 9 {
            columns.push("FORMAT");
        }
        if columns.len() < 10 {
            columns.push("SAMPLE");
        }
        writeln!(inner, "{}", columns.join("\t"))?;

        Ok(Self {
            inner,
            line: String::new(),
        })
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, AnnotateError> {
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn render(&mut self, call: &VariantCall) {
        let line = &mut self.line;
        line.clear();
        let counts = &call.counts;
        let _ = write!(
            line,
            "{}\t{}\t{}\t{}\t{}",
            call.chrom, call.position, call.id, call.reference, call.alternate
        );
        for idx in 0..3 {
            line.push('\t');
            line.push_str(call.trailing.get(idx).map_or(".", String::as_str));
        }
        let ad = format!("{},{}", counts.ref_count, counts.alt_count);
        let dp = counts.depth().to_string();
        match call.trailing.get(3) {
            Some(format) => {
                let mut keys: Vec<&str> = format.split(':').collect();
                let mut values: Vec<&str> = call
                    .trailing
                    .get(4)
                    .map(|sample| sample.split(':').collect())
                    .unwrap_or_default();
                // trailing sample fields may be omitted
                values.resize(values.len().max(keys.len()), ".");
                for (key, value) in [("AD", ad.as_str()), ("DP", dp.as_str())] {
                    match keys.iter().position(|k| *k == key) {
                        Some(idx) => values[idx] = value,
                        None => {
                            values.truncate(keys.len());
                            keys.push(key);
                            values.push(value);
                        }
                    }
                }
                let _ = writeln!(line, "\t{}\t{}", keys.join(":"), values.join(":"));
            }
            None => {
                let _ = writeln!(line, "\tAD:DP\t{ad}:{dp}");
            }
        }
    }
}

impl<W: Write> CallSink for VcfWriter<W> {
    fn write_call(&mut self, call: &VariantCall) -> Result<(), AnnotateError> {
        self.render(call);
        self.inner.write_all(self.line.as_bytes())?;
        Ok(())
    }
}

/// Write a header and calls in annotated VCF form.
pub fn write_vcf<W: Write>(writer: W, header: &VcfHeader, calls: &[VariantCall]) -> Result<W> {
    let mut vcf = VcfWriter::new(writer, header)?;
    for call in calls {
        vcf.write_call(call)?;
    }
    Ok(vcf.finish()?)
}

/// Render annotated calls into a VCF string (useful for tests and snapshots).
pub fn render_vcf(header: &VcfHeader, calls: &[VariantCall]) -> Result<String> {
    let buffer = write_vcf(Vec::new(), header, calls)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered VCF is not valid UTF-8"))
}
