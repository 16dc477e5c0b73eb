use anyhow::{Context, Result};
use clap::ArgMatches;

use vcfprep_io::{PipelineConfig, StreamingPipeline, TsvWriter, VcfReader};

use crate::progress::create_record_spinner;

/// Multi-allelic sites are still split so every row is biallelic; alleles are left as written.
fn qc_config(threads: usize) -> PipelineConfig {
    PipelineConfig {
        threads,
        normalize: false,
        normalize_decomposed: false,
        decompose: true,
        compute_qc: true,
        ..PipelineConfig::default()
    }
}

pub fn run_qc(matches: &ArgMatches) -> Result<()> {
    let vcf_path = matches
        .get_one::<String>("vcf")
        .context("--vcf is required")?;
    let output_path = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("-");
    let threads = matches.get_one::<usize>("threads").copied().unwrap_or(0);

    let reader = VcfReader::from_path_or_stdin(vcf_path)?;
    let mut writer = TsvWriter::from_path(output_path)
        .with_context(|| format!("Failed to open output: {}", output_path))?;

    let pb = create_record_spinner(format!("Computing QC for {}", vcf_path))?;
    let stats = StreamingPipeline::new(qc_config(threads))
        .with_progress(pb.clone())
        .run(reader, &mut writer)
        .with_context(|| format!("Failed to process {}", vcf_path))?;
    pb.finish_with_message(format!(
        "Wrote {} rows, skipped {} malformed lines",
        stats.records_out, stats.malformed_skipped
    ));

    Ok(())
}
