//! # Genotype QC metrics
//!
//! Population-genetics summaries of one variant computed from its column of GT calls:
//! genotype counts, alternate/minor allele frequency, minor allele count and the
//! exact Hardy-Weinberg equilibrium test of Wigginton, Cutler & Abecasis (2005).
//!
//! Undefined results (no called genotypes, infeasible counts) are `None`, never NaN.

pub mod frequency;
pub mod genotype;
pub mod hwe;
pub mod metrics;

pub use frequency::{AlleleFrequencies, allele_frequencies};
pub use genotype::{GenotypeCall, GenotypeCounts, genotype_counts, parse_genotype};
pub use hwe::hwe_pvalue;
pub use metrics::QcMetrics;
