//! Reference-genome access for normalization.
//!
//! Normalization only ever needs one base to the left of a variant, so the
//! capability is a single `fetch` over 0-based, half-open coordinates.

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use fxhash::FxHashMap;
use tracing::info;

use vcfprep_core::errors::ReferenceError;
use vcfprep_core::utils::get_dynamic_reader;

/// Read-only access to reference sequence.
///
/// Implementations must be deterministic: the same query returns the same bases.
/// They may block (disk, network); callers size their worker pools accordingly.
pub trait ReferenceFetch: Send + Sync {
    /// Bases of `chrom` in `[start, end)`, 0-based.
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>, ReferenceError>;

    /// Whether `chrom` is known to this reference.
    fn has_contig(&self, _chrom: &str) -> bool {
        true
    }
}

impl<F> ReferenceFetch for F
where
    F: Fn(&str, u64, u64) -> Result<Vec<u8>, ReferenceError> + Send + Sync,
{
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>, ReferenceError> {
        self(chrom, start, end)
    }
}

///
/// Whole reference genome held in memory, keyed by contig name.
///
#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    contigs: FxHashMap<String, Vec<u8>>,
}

impl InMemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a contig. Bases are stored uppercase.
    pub fn insert<S: Into<String>>(&mut self, name: S, sequence: &[u8]) {
        self.contigs
            .insert(name.into(), sequence.to_ascii_uppercase());
    }

    pub fn with_contig<S: Into<String>>(mut self, name: S, sequence: &str) -> Self {
        self.insert(name, sequence.as_bytes());
        self
    }

    ///
    /// Load every record of a FASTA file (plain or gzip'd).
    ///
    /// Contig names are the header up to the first whitespace.
    ///
    /// # Arguments
    /// - path: path to the FASTA file
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = get_dynamic_reader(path)?;
        let mut reference = InMemoryReference::new();

        let mut line = String::new();
        let mut current_name: Option<String> = None;
        let mut current_seq: Vec<u8> = Vec::new();
        let mut line_no = 0usize;

        loop {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .with_context(|| format!("Failed to read FASTA: {:?}", path))?;
            if bytes_read == 0 {
                break;
            }
            line_no += 1;

            let trimmed = line.trim_end();
            if let Some(header) = trimmed.strip_prefix('>') {
                if let Some(name) = current_name.take() {
                    reference.insert(name, &current_seq);
                    current_seq.clear();
                }
                let name = header.split_whitespace().next().unwrap_or_default();
                anyhow::ensure!(
                    !name.is_empty(),
                    "Empty FASTA header at line {} of {:?}",
                    line_no,
                    path
                );
                current_name = Some(name.to_string());
            } else if !trimmed.is_empty() {
                anyhow::ensure!(
                    current_name.is_some(),
                    "Sequence data before first FASTA header at line {} of {:?}",
                    line_no,
                    path
                );
                current_seq.extend_from_slice(trimmed.as_bytes());
            }
        }
        if let Some(name) = current_name.take() {
            reference.insert(name, &current_seq);
        }

        info!(
            contigs = reference.contigs.len(),
            "loaded reference {}",
            path.display()
        );
        Ok(reference)
    }

    pub fn contig_len(&self, chrom: &str) -> Option<u64> {
        self.contigs.get(chrom).map(|s| s.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }
}

impl ReferenceFetch for InMemoryReference {
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>, ReferenceError> {
        let sequence = self
            .contigs
            .get(chrom)
            .ok_or_else(|| ReferenceError::UnknownContig(chrom.to_string()))?;
        let length = sequence.len() as u64;
        if start > end || end > length {
            return Err(ReferenceError::OutOfBounds {
                chrom: chrom.to_string(),
                start,
                end,
                length,
            });
        }
        Ok(sequence[start as usize..end as usize].to_vec())
    }

    fn has_contig(&self, chrom: &str) -> bool {
        self.contigs.contains_key(chrom)
    }
}
