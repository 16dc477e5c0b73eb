//! # VCF input, bulk-load output and the streaming pipeline
//!
//! The thin collaborators around the variant core: a line-oriented VCF reader that turns
//! text into [`vcfprep_core::models::AnnotatedRecord`]s together with the header's field
//! definitions, a TSV writer producing PostgreSQL `COPY` input, and
//! [`StreamingPipeline`], which connects the two through normalization, decomposition
//! and genotype QC.
//!
pub mod config;
pub mod error;
pub mod header;
pub mod pipeline;
pub mod reader;
pub mod writer;

pub use config::{PipelineConfig, PipelineConfigError};
pub use error::*;
pub use header::{FieldNamespace, VcfHeader, parse_field_definition};
pub use pipeline::{PipelineStats, ProcessedRecord, RecordOutput, RecordSink, StreamingPipeline};
pub use reader::{VcfReader, parse_record};
pub use writer::{NULL, TSV_COLUMNS, TsvWriter, escape_copy};
