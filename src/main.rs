//! fwbaseline - baseline packet-filter policy for Linux hosts
//!
//! Installs a default-deny inbound, default-accept outbound stateful policy
//! for IPv4 and IPv6 and has systemd restore it at boot.

use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use fwbaseline::cli::{Cli, Commands};
use fwbaseline::error::FwError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("fwbaseline: failed to initialize logging: {}", e);
    }

    // Execute command
    let result = match cli.command {
        Commands::Install { family } => fwbaseline::commands::install::run(family, &cli.config),
        Commands::Remove { family } => fwbaseline::commands::remove::run(family, &cli.config),
        Commands::Status { family, json } => {
            fwbaseline::commands::status::run(family, json, &cli.config)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let step = e.downcast_ref::<FwError>().map_or("error", FwError::step);
            eprintln!("fwbaseline: {}: {:#}", step, e);
            ExitCode::FAILURE
        }
    }
}
