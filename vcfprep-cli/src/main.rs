mod normalize;
mod progress;
mod qc;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::{EnvFilter, fmt};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "vcfprep";
    pub const BIN_NAME: &str = "vcfprep";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Normalize, decompose and QC VCF variants into bulk-load ready tables.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug messages (overrides RUST_LOG)"),
        )
        .subcommand(normalize::cli::create_normalize_cli())
        .subcommand(qc::cli::create_qc_cli())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();
    init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        //
        // NORMALIZE + DECOMPOSE + QC
        //
        Some((normalize::cli::NORMALIZE_CMD, matches)) => {
            normalize::handlers::run_normalize(matches)?;
        }

        //
        // QC ONLY
        //
        Some((qc::cli::QC_CMD, matches)) => {
            qc::handlers::run_qc(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
