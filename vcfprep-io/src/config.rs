use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vcfprep_variants::DecomposeOptions;

/// Settings of a [`crate::pipeline::StreamingPipeline`] run, read from TOML.
///
/// Every key is optional; missing keys take their default.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Raw records per batch handed to the workers.
    pub batch_size: usize,
    /// Depth of the bounded reader to worker queue, in batches.
    pub channel_capacity: usize,
    /// Worker threads, `0` for the rayon default.
    pub threads: usize,
    pub normalize: bool,
    /// Re-normalize each biallelic record after decomposition.
    pub normalize_decomposed: bool,
    pub decompose: bool,
    pub compute_qc: bool,
    pub reindex_genotypes: bool,
    /// Normalize records on contigs the reference lacks without the reference instead of failing.
    pub skip_unknown_chrom: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            batch_size: 1000,
            channel_capacity: 4,
            threads: 0,
            normalize: true,
            normalize_decomposed: true,
            decompose: true,
            compute_qc: true,
            reindex_genotypes: true,
            skip_unknown_chrom: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineConfigError {
    #[error("{0} must be at least 1")]
    ZeroValue(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type PipelineConfigResult<T> = std::result::Result<T, PipelineConfigError>;

impl PipelineConfig {
    pub fn from_toml_str(contents: &str) -> PipelineConfigResult<Self> {
        let config: PipelineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineConfigResult<()> {
        if self.batch_size == 0 {
            return Err(PipelineConfigError::ZeroValue("batch_size"));
        }
        if self.channel_capacity == 0 {
            return Err(PipelineConfigError::ZeroValue("channel_capacity"));
        }
        Ok(())
    }

    pub fn decompose_options(&self) -> DecomposeOptions {
        DecomposeOptions {
            reindex_genotypes: self.reindex_genotypes,
        }
    }
}

impl TryFrom<&Path> for PipelineConfig {
    type Error = PipelineConfigError;

    fn try_from(path: &Path) -> PipelineConfigResult<Self> {
        let contents = read_to_string(path)?;
        PipelineConfig::from_toml_str(&contents)
    }
}
