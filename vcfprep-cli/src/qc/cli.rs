use clap::{Command, arg, value_parser};

pub const QC_CMD: &str = "qc";

pub fn create_qc_cli() -> Command {
    Command::new(QC_CMD)
        .about("Compute per-variant genotype QC (counts, allele frequencies, HWE p-value) without normalizing.")
        .arg(
            arg!(--vcf <VCF>)
                .required(true)
                .help("Path to input VCF (.vcf, .vcf.gz or .vcf.bgz; - for stdin)"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .default_value("-")
                .help("Output TSV path, gzip compressed when it ends in .gz (default: stdout)"),
        )
        .arg(
            arg!(--threads <THREADS>)
                .required(false)
                .value_parser(value_parser!(usize))
                .help("Worker threads (default: all cores)"),
        )
}
