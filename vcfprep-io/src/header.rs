//! VCF header parsing: `##INFO`/`##FORMAT` field definitions and the sample list.

use vcfprep_core::models::{FieldSpec, FieldSpecTable, NumberKind};

use crate::error::{Result, VcfError};

/// Which `FieldSpecTable` namespace a definition line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldNamespace {
    Info,
    Format,
}

/// The parts of a VCF header the pipeline needs.
#[derive(Debug, Clone, Default)]
pub struct VcfHeader {
    pub field_specs: FieldSpecTable,
    pub samples: Vec<String>,
    /// `fileformat` value, when declared.
    pub file_format: Option<String>,
}

impl VcfHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one `##` meta-information line.
    pub fn add_meta_line(&mut self, line: &str, line_no: usize) -> Result<()> {
        if let Some(version) = line.strip_prefix("##fileformat=") {
            self.file_format = Some(version.to_string());
            return Ok(());
        }
        if let Some((namespace, spec)) = parse_field_definition(line, line_no)? {
            match namespace {
                FieldNamespace::Info => self.field_specs.insert_info(spec),
                FieldNamespace::Format => self.field_specs.insert_format(spec),
            }
        }
        Ok(())
    }

    /// Consume the `#CHROM` column line and collect sample names.
    pub fn set_columns(&mut self, line: &str, line_no: usize) -> Result<()> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 8 || columns[0] != "#CHROM" {
            return Err(VcfError::MalformedHeader {
                line: line_no,
                reason: format!("expected at least 8 tab separated columns, found {}", columns.len()),
            });
        }
        self.samples = columns.iter().skip(9).map(|s| s.to_string()).collect();
        Ok(())
    }
}

/// Parse `##INFO=<...>` or `##FORMAT=<...>` into a field spec.
///
/// Other meta lines yield `Ok(None)`. A definition without `ID` is an error; one
/// without `Number` is kept as [`NumberKind::Unknown`].
pub fn parse_field_definition(
    line: &str,
    line_no: usize,
) -> Result<Option<(FieldNamespace, FieldSpec)>> {
    let (namespace, body) = if let Some(rest) = line.strip_prefix("##INFO=") {
        (FieldNamespace::Info, rest)
    } else if let Some(rest) = line.strip_prefix("##FORMAT=") {
        (FieldNamespace::Format, rest)
    } else {
        return Ok(None);
    };

    let body = body
        .trim()
        .strip_prefix('<')
        .and_then(|b| b.strip_suffix('>'))
        .ok_or_else(|| VcfError::MalformedHeader {
            line: line_no,
            reason: "field definition must be enclosed in <...>".to_string(),
        })?;

    let mut id = None;
    let mut number = NumberKind::Unknown;
    for (key, value) in split_structured(body) {
        match key {
            "ID" => id = Some(value),
            "Number" => number = NumberKind::from(value),
            _ => {}
        }
    }

    let id = id.filter(|id| !id.is_empty()).ok_or_else(|| VcfError::MalformedHeader {
        line: line_no,
        reason: "field definition has no ID".to_string(),
    })?;

    Ok(Some((namespace, FieldSpec::new(id, number))))
}

// key=value pairs separated by commas, ignoring commas inside double quotes
fn split_structured(body: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    let bytes = body.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' if i == 0 || bytes[i - 1] != b'\\' => in_quotes = !in_quotes,
            b',' if !in_quotes => {
                pairs.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pairs.push(&body[start..]);

    pairs
        .into_iter()
        .filter_map(|item| {
            let (key, value) = item.split_once('=')?;
            Some((key.trim(), value.trim()))
        })
        .collect()
}
