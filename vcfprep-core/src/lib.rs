//! # Core data model for vcfprep
//!
//! Types shared by every stage of the variant preparation pipeline:
//!
//! - [`AlleleSet`]: a REF/ALT allele set at a 1-based position
//! - [`NumberKind`] and [`FieldSpec`]: the parsed `Number=` declaration of an INFO/FORMAT field
//! - [`FieldSpecTable`]: the per-file lookup from field name to its declaration
//! - [`AnnotatedRecord`] and [`DecomposedRecord`]: variant records before and after
//!   multi-allelic decomposition
//! - [`arity`]: expected array lengths for `Number=A/R/G` fields and genotype indexing
//! - [`utils`]: gzip-aware readers and writers shared by the I/O crates
pub mod arity;
pub mod errors;
pub mod models;
pub mod utils;

// re-export for cleaner imports
pub use arity::{ArraySize, array_size, genotype_index, get_array_size, n_genotypes};
pub use errors::{ReferenceError, VariantError};
pub use models::{
    AlleleSet, AnnotatedRecord, DecomposedRecord, FieldMap, FieldSpec, FieldSpecTable,
    FieldValue, NumberKind, SampleFields,
};
