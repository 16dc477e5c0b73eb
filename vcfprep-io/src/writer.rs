//! Bulk-load TSV output in PostgreSQL `COPY ... FROM` text format.

use std::borrow::Cow;
use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result};
use vcfprep_core::utils::{DynamicWriter, FinishWrite, get_dynamic_writer};

use crate::pipeline::{ProcessedRecord, RecordSink};

/// Output columns, in order.
pub const TSV_COLUMNS: [&str; 14] = [
    "chrom",
    "pos",
    "ref",
    "alt",
    "variant_type",
    "info",
    "n_called",
    "n_het",
    "n_hom_ref",
    "n_hom_alt",
    "aaf",
    "maf",
    "mac",
    "hwe_p",
];

/// `COPY` text-format null marker.
pub const NULL: &str = "\\N";

/// Writes one row per processed record; the header row is written before the first record.
pub struct TsvWriter<W: Write> {
    inner: W,
    header_written: bool,
    rows: u64,
}

impl TsvWriter<DynamicWriter> {
    /// Write to a file (gzip when it ends in `.gz`) or stdout for `-`.
    pub fn from_path(path: &str) -> Result<Self> {
        Ok(TsvWriter::new(get_dynamic_writer(path)?))
    }
}

impl<W: Write> TsvWriter<W> {
    pub fn new(inner: W) -> Self {
        TsvWriter {
            inner,
            header_written: false,
            rows: 0,
        }
    }

    /// Data rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_header(&mut self) -> Result<()> {
        writeln!(self.inner, "{}", TSV_COLUMNS.join("\t")).context("Failed to write TSV header")?;
        self.header_written = true;
        Ok(())
    }

    pub fn write_row(&mut self, processed: &ProcessedRecord) -> Result<()> {
        if !self.header_written {
            self.write_header()?;
        }
        let record = &processed.record;
        let info = serde_json::to_string(&record.info)
            .with_context(|| format!("Failed to serialize INFO of {}:{}", record.chrom, record.pos))?;

        let mut row: Vec<Cow<'_, str>> = vec![
            escape_copy(&record.chrom),
            Cow::Owned(record.pos.to_string()),
            escape_copy(&record.ref_allele),
            escape_copy(&record.alt),
            Cow::Owned(processed.variant_type.to_string()),
            Cow::Owned(escape_copy(&info).into_owned()),
        ];

        match &processed.qc {
            Some(qc) => {
                row.push(Cow::Owned(qc.counts.n_called.to_string()));
                row.push(Cow::Owned(qc.counts.n_het.to_string()));
                row.push(Cow::Owned(qc.counts.n_hom_ref.to_string()));
                row.push(Cow::Owned(qc.counts.n_hom_alt.to_string()));
                row.push(nullable(qc.aaf));
                row.push(nullable(qc.maf));
                row.push(nullable(qc.mac));
                row.push(nullable(qc.hwe_pvalue));
            }
            None => row.extend(std::iter::repeat_n(Cow::Borrowed(NULL), 8)),
        }

        writeln!(self.inner, "{}", row.join("\t"))
            .with_context(|| format!("Failed to write row for {}:{}", record.chrom, record.pos))?;
        self.rows += 1;
        Ok(())
    }
}

impl<W: FinishWrite> RecordSink for TsvWriter<W> {
    fn write_record(&mut self, record: &ProcessedRecord) -> Result<()> {
        self.write_row(record)
    }

    fn finish(&mut self) -> Result<()> {
        if !self.header_written {
            self.write_header()?;
        }
        self.inner
            .try_finish()
            .context("Failed to finish TSV output")
    }
}

fn nullable<T: Display>(value: Option<T>) -> Cow<'static, str> {
    match value {
        Some(v) => Cow::Owned(v.to_string()),
        None => Cow::Borrowed(NULL),
    }
}

/// Escape backslash, tab and line breaks for the `COPY` text format.
pub fn escape_copy(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '\t', '\n', '\r']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use vcfprep_core::models::{DecomposedRecord, FieldMap, FieldValue};
    use vcfprep_qc::QcMetrics;
    use vcfprep_variants::VariantType;

    fn processed(qc: Option<QcMetrics>) -> ProcessedRecord {
        let info: FieldMap = vec![
            ("AF", FieldValue::parse("0.5")),
            ("DB", FieldValue::Flag),
            ("RC", FieldValue::parse("3,4")),
        ]
        .into_iter()
        .collect();
        ProcessedRecord {
            record: DecomposedRecord {
                chrom: "chr1".to_string(),
                pos: 100,
                ref_allele: "A".to_string(),
                alt: "G".to_string(),
                info,
                samples: Vec::new(),
                alt_index: 0,
                n_source_alts: 1,
            },
            variant_type: VariantType::Snp,
            qc,
        }
    }

    fn output(writer: TsvWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[rstest]
    fn test_row_with_qc() {
        let mut writer = TsvWriter::new(Vec::new());
        let qc = QcMetrics::from_calls(["0/0", "0/1", "1/1", "./."]);
        writer.write_record(&processed(Some(qc))).unwrap();
        writer.finish().unwrap();

        let text = output(writer);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], TSV_COLUMNS.join("\t"));
        let cols: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(cols.len(), TSV_COLUMNS.len());
        assert_eq!(&cols[..5], &["chr1", "100", "A", "G", "snp"]);
        assert_eq!(cols[5], r#"{"AF":"0.5","DB":true,"RC":["3","4"]}"#);
        assert_eq!(&cols[6..13], &["3", "1", "1", "1", "0.5", "0.5", "3"]);
    }

    #[rstest]
    fn test_row_without_qc_is_null() {
        let mut writer = TsvWriter::new(Vec::new());
        writer.write_record(&processed(None)).unwrap();
        assert_eq!(writer.rows(), 1);

        let text = output(writer);
        let row = text.lines().nth(1).unwrap();
        let nulls = row.split('\t').skip(6).filter(|c| *c == NULL).count();
        assert_eq!(nulls, 8);
    }

    #[rstest]
    fn test_undefined_frequencies_are_null() {
        let mut writer = TsvWriter::new(Vec::new());
        let qc = QcMetrics::from_calls(["./.", "./."]);
        writer.write_record(&processed(Some(qc))).unwrap();

        let text = output(writer);
        let cols: Vec<&str> = text.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(&cols[6..], &["0", "0", "0", "0", NULL, NULL, NULL, "1"]);
    }

    #[rstest]
    fn test_empty_output_has_header() {
        let mut writer = TsvWriter::new(Vec::new());
        writer.finish().unwrap();
        assert_eq!(output(writer), format!("{}\n", TSV_COLUMNS.join("\t")));
    }

    #[rstest]
    fn test_gzip_output_complete_after_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.tsv.gz");
        let mut writer = TsvWriter::from_path(path.to_str().unwrap()).unwrap();
        writer.write_record(&processed(None)).unwrap();
        writer.finish().unwrap();

        // readable before the writer is dropped
        let reader = vcfprep_core::utils::get_dynamic_reader(&path).unwrap();
        let lines: Vec<String> = std::io::BufRead::lines(reader).map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("chr1\t100\tA\tG\tsnp"));
        drop(writer);
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("a\tb", "a\\tb")]
    #[case("x\\\"y", "x\\\\\"y")]
    #[case("line\nbreak\r", "line\\nbreak\\r")]
    fn test_escape_copy(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(escape_copy(raw), expected);
    }
}
