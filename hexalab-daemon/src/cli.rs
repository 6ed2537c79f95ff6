//! CLI argument definitions for hexalab-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Hexalab SBOM/CVE scan daemon.
///
/// Serves the scan HTTP API and runs the background worker pool that
/// executes SBOM generation and vulnerability scans.
#[derive(Parser, Debug)]
#[command(name = "hexalab-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to hexalab.toml configuration file.
    #[arg(short, long, default_value = "/etc/hexalab/hexalab.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty, compact).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the HTTP listen port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
