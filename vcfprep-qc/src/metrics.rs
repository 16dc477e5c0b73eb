use serde::Serialize;

use crate::frequency::allele_frequencies;
use crate::genotype::{GenotypeCounts, genotype_counts};
use crate::hwe::hwe_pvalue;

/// Per-variant QC summary, derived purely from genotype counts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct QcMetrics {
    pub counts: GenotypeCounts,
    pub aaf: Option<f64>,
    pub maf: Option<f64>,
    pub mac: Option<u64>,
    pub hwe_pvalue: Option<f64>,
}

impl QcMetrics {
    pub fn from_counts(counts: &GenotypeCounts) -> Self {
        let freqs = allele_frequencies(counts.n_het, counts.n_hom_ref, counts.n_hom_alt);
        QcMetrics {
            counts: *counts,
            aaf: freqs.aaf,
            maf: freqs.maf,
            mac: freqs.mac,
            hwe_pvalue: hwe_pvalue(counts.n_het, counts.n_hom_ref, counts.n_hom_alt),
        }
    }

    /// Count a column of GT strings and summarize it.
    pub fn from_calls<I, S>(calls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_counts(&genotype_counts(calls))
    }
}
