use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const NORMALIZE_CMD: &str = "normalize";

pub fn create_normalize_cli() -> Command {
    Command::new(NORMALIZE_CMD)
        .about("Normalize, decompose and QC the variants of a VCF into a bulk-load TSV.")
        .arg(
            arg!(--vcf <VCF>)
                .required(true)
                .help("Path to input VCF (.vcf, .vcf.gz or .vcf.bgz; - for stdin)"),
        )
        .arg(
            arg!(--reference <FASTA>)
                .required(false)
                .help("Reference FASTA (plain or .gz) used to left-align indels"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .default_value("-")
                .help("Output TSV path, gzip compressed when it ends in .gz (default: stdout)"),
        )
        .arg(
            arg!(--config <CONFIG>)
                .required(false)
                .help("Pipeline config TOML; command line flags take precedence"),
        )
        .arg(
            Arg::new("no-qc")
                .long("no-qc")
                .action(ArgAction::SetTrue)
                .help("Skip genotype QC metrics"),
        )
        .arg(
            arg!(--threads <THREADS>)
                .required(false)
                .value_parser(value_parser!(usize))
                .help("Worker threads (default: all cores)"),
        )
}
