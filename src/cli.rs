//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::family::AddressFamily;

#[derive(Parser)]
#[command(name = "fwbaseline")]
#[command(
    author,
    version,
    about = "Baseline stateful iptables/ip6tables policy, restored at boot by systemd"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the baseline firewall and enable its restore unit
    Install {
        /// Address family: 4 or 6 (default: both)
        family: Option<AddressFamily>,
    },

    /// Stop the restore unit and remove every managed file
    Remove {
        /// Address family: 4 or 6 (default: both)
        family: Option<AddressFamily>,
    },

    /// Show what is installed (no root required)
    Status {
        /// Address family: 4 or 6 (default: both)
        family: Option<AddressFamily>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
