//! Line-oriented VCF text reader (plain or gzip/bgzf).

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::Context;
use vcfprep_core::models::{AlleleSet, AnnotatedRecord, FieldMap, FieldValue, SampleFields};
use vcfprep_core::utils::{get_dynamic_reader, get_dynamic_reader_w_stdin};

use crate::error::{Result, VcfError};
use crate::header::VcfHeader;

/// Reader over the data lines of a VCF, yielding [`AnnotatedRecord`]s.
///
/// The header is parsed eagerly on construction. Malformed data lines are yielded as
/// [`VcfError::MalformedRecord`] and reading can continue past them.
pub struct VcfReader<R> {
    reader: R,
    header: VcfHeader,
    line_no: usize,
    buf: String,
    pending: Option<String>,
}

impl VcfReader<BufReader<Box<dyn Read + Send>>> {
    /// Open a VCF file; `.gz`/`.bgz` files are decompressed.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let reader = get_dynamic_reader(path)?;
        Self::new(reader).with_context(|| format!("Failed to read VCF header: {}", path.display()))
    }

    /// Open a VCF file, or stdin when `path` is `-`.
    pub fn from_path_or_stdin(path: &str) -> anyhow::Result<Self> {
        let reader = get_dynamic_reader_w_stdin(path)?;
        Self::new(reader).with_context(|| format!("Failed to read VCF header: {}", path))
    }
}

impl<R: BufRead> VcfReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut vcf = VcfReader {
            reader,
            header: VcfHeader::new(),
            line_no: 0,
            buf: String::new(),
            pending: None,
        };
        vcf.read_header()?;
        Ok(vcf)
    }

    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    /// Current line number (1-based) of the last line read.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn next_line(&mut self) -> Result<bool> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(false);
        }
        self.line_no += 1;
        let trimmed = self.buf.trim_end_matches(['\n', '\r']).len();
        self.buf.truncate(trimmed);
        Ok(true)
    }

    fn read_header(&mut self) -> Result<()> {
        while self.next_line()? {
            if self.buf.starts_with("##") {
                let line = std::mem::take(&mut self.buf);
                self.header.add_meta_line(&line, self.line_no)?;
            } else if self.buf.starts_with('#') {
                let line = std::mem::take(&mut self.buf);
                self.header.set_columns(&line, self.line_no)?;
                return Ok(());
            } else if !self.buf.is_empty() {
                // headerless input: the first data line is kept for the iterator
                self.pending = Some(std::mem::take(&mut self.buf));
                return Ok(());
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<AnnotatedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(line) = self.pending.take() {
            return Some(parse_record(&line, self.line_no, &self.header));
        }
        loop {
            match self.next_line() {
                Ok(false) => return None,
                Ok(true) if self.buf.is_empty() || self.buf.starts_with('#') => continue,
                Ok(true) => return Some(parse_record(&self.buf, self.line_no, &self.header)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> VcfError {
    VcfError::MalformedRecord {
        line,
        reason: reason.into(),
    }
}

/// Parse one tab separated VCF data line.
pub fn parse_record(line: &str, line_no: usize, header: &VcfHeader) -> Result<AnnotatedRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 8 {
        return Err(malformed(
            line_no,
            format!("expected at least 8 columns, found {}", fields.len()),
        ));
    }

    let chrom = fields[0];
    if chrom.is_empty() {
        return Err(malformed(line_no, "empty CHROM"));
    }
    let pos: u64 = fields[1]
        .parse()
        .map_err(|_| malformed(line_no, format!("invalid POS '{}'", fields[1])))?;
    let ref_allele = fields[3];
    if ref_allele.is_empty() || ref_allele == "." {
        return Err(malformed(line_no, "missing REF allele"));
    }
    let alts: Vec<String> = fields[4].split(',').map(str::to_string).collect();

    let info = parse_info(fields[7]);
    let samples = if fields.len() > 8 {
        parse_samples(fields[8], &fields[9..], header, line_no)?
    } else {
        Vec::new()
    };

    Ok(AnnotatedRecord::new(AlleleSet::new(chrom, pos, ref_allele, alts))
        .with_info(info)
        .with_samples(samples))
}

fn parse_info(column: &str) -> FieldMap {
    if column == "." || column.is_empty() {
        return FieldMap::new();
    }
    column
        .split(';')
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((key, value)) => (key, FieldValue::parse(value)),
            None => (item, FieldValue::Flag),
        })
        .collect()
}

fn parse_samples(
    format: &str,
    columns: &[&str],
    header: &VcfHeader,
    line_no: usize,
) -> Result<Vec<SampleFields>> {
    if columns.len() != header.samples.len() {
        return Err(malformed(
            line_no,
            format!(
                "{} sample columns for {} samples in header",
                columns.len(),
                header.samples.len()
            ),
        ));
    }
    let keys: Vec<&str> = format.split(':').collect();

    header
        .samples
        .iter()
        .zip(columns)
        .map(|(sample_id, column)| {
            let values: Vec<&str> = column.split(':').collect();
            if values.len() > keys.len() {
                return Err(malformed(
                    line_no,
                    format!("sample {} has more values than FORMAT keys", sample_id),
                ));
            }
            // trailing FORMAT keys may be dropped from a sample column
            let fields = keys
                .iter()
                .zip(values)
                .map(|(key, value)| (*key, FieldValue::parse(value)))
                .collect();
            Ok(SampleFields::new(sample_id.as_str(), fields))
        })
        .collect()
}
