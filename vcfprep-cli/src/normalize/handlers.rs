use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use tracing::info;

use vcfprep_io::{PipelineConfig, StreamingPipeline, TsvWriter, VcfReader};
use vcfprep_variants::InMemoryReference;

use crate::progress::create_record_spinner;

pub fn run_normalize(matches: &ArgMatches) -> Result<()> {
    let vcf_path = matches
        .get_one::<String>("vcf")
        .context("--vcf is required")?;
    let output_path = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("-");

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => PipelineConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load pipeline config: {}", path))?,
        None => PipelineConfig::default(),
    };
    if matches.get_flag("no-qc") {
        config.compute_qc = false;
    }
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.threads = *threads;
    }

    let mut pipeline = StreamingPipeline::new(config);
    match matches.get_one::<String>("reference") {
        Some(fasta) => {
            let reference = InMemoryReference::from_fasta(fasta)
                .with_context(|| format!("Failed to load reference: {}", fasta))?;
            pipeline = pipeline.with_reference(reference);
        }
        None => info!("no reference given, indels are trimmed but not left-aligned"),
    }

    let reader = VcfReader::from_path_or_stdin(vcf_path)?;
    let mut writer = TsvWriter::from_path(output_path)
        .with_context(|| format!("Failed to open output: {}", output_path))?;

    let pb = create_record_spinner(format!("Normalizing {}", vcf_path))?;
    let stats = pipeline
        .with_progress(pb.clone())
        .run(reader, &mut writer)
        .with_context(|| format!("Failed to process {}", vcf_path))?;
    pb.finish_with_message(format!(
        "Wrote {} rows ({} multi-allelic records split, {} normalized)",
        stats.records_out, stats.multiallelic_split, stats.normalized
    ));

    Ok(())
}
