//! # Variant normalization and decomposition
//!
//! This crate canonicalizes VCF allele sets and splits multi-allelic sites. It provides:
//!
//! - Allele normalization: left-alignment and parsimony (vt `normalize`)
//! - Multi-allelic decomposition with `Number=A/R/G` aware re-indexing of INFO and FORMAT fields
//! - The reference-fetch capability used to extend alleles to the left

pub mod decompose;
pub mod normalize;
pub mod reference;

pub use decompose::{
    DecomposeOptions, decompose, decompose_multiallelic, decompose_with, reindex_genotype,
};
pub use normalize::{
    NormalizedAlleles, VariantType, classify_variant, is_normalized, normalize,
    normalize_allele_set,
};
pub use reference::{InMemoryReference, ReferenceFetch};
