use thiserror::Error;

use crate::models::NumberKind;

/// Failure of the reference-fetch capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("unknown contig: {0}")]
    UnknownContig(String),

    #[error("region {chrom}:{start}-{end} is outside contig of length {length}")]
    OutOfBounds {
        chrom: String,
        start: u64,
        end: u64,
        length: u64,
    },

    #[error("reference returned {observed} bases for {chrom}:{start}-{end}")]
    ShortRead {
        chrom: String,
        start: u64,
        end: u64,
        observed: usize,
    },
}

/// Record-level errors raised while normalizing or decomposing a variant.
///
/// Every variant carries the originating `chrom:pos` so failures can be traced
/// back to the input record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariantError {
    #[error(
        "{chrom}:{pos}: field {field} (Number={number}) has {observed} values, expected {expected}"
    )]
    FieldArityMismatch {
        chrom: String,
        pos: u64,
        field: String,
        number: NumberKind,
        expected: usize,
        observed: usize,
    },

    #[error("{chrom}:{pos}: sample {sample} has ploidy {ploidy}, field {field} needs 1 or 2")]
    UnsupportedPloidy {
        chrom: String,
        pos: u64,
        sample: String,
        field: String,
        ploidy: usize,
    },

    #[error("{chrom}:{pos}: reference lookup failed: {source}")]
    Reference {
        chrom: String,
        pos: u64,
        #[source]
        source: ReferenceError,
    },
}

impl VariantError {
    /// The `(chrom, pos)` of the record that raised this error.
    pub fn locus(&self) -> (&str, u64) {
        match self {
            VariantError::FieldArityMismatch { chrom, pos, .. }
            | VariantError::UnsupportedPloidy { chrom, pos, .. }
            | VariantError::Reference { chrom, pos, .. } => (chrom.as_str(), *pos),
        }
    }
}
