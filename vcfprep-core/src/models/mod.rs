pub mod allele_set;
pub mod field;
pub mod record;

// re-export for cleaner imports
pub use self::allele_set::{AlleleSet, is_missing_allele, is_symbolic_allele};
pub use self::field::{FieldMap, FieldSpec, FieldSpecTable, FieldValue, NumberKind};
pub use self::record::{AnnotatedRecord, DecomposedRecord, SampleFields};
