use std::io;
use thiserror::Error;

/// Error type for VCF reading.
#[derive(Error, Debug)]
pub enum VcfError {
    /// IO error occurred while reading the file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A data line could not be parsed into a record.
    #[error("line {line}: malformed record: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A meta-information or column header line could not be parsed.
    #[error("line {line}: malformed header: {reason}")]
    MalformedHeader { line: usize, reason: String },
}

impl VcfError {
    /// Malformed data lines can be skipped; everything else ends the read.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VcfError::MalformedRecord { .. })
    }
}

/// Result type alias for vcfprep-io operations.
pub type Result<T> = std::result::Result<T, VcfError>;
