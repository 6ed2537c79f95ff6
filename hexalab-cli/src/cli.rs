//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Hexalab -- SBOM generation and CVE scanning.
///
/// Use `hexalab <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "hexalab", version, about, long_about = None)]
pub struct Cli {
    /// Path to the hexalab.toml configuration file.
    #[arg(short, long, default_value = "hexalab.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an SBOM for the given files and scan it for known CVEs.
    Scan(ScanArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Run the full scan pipeline once, in the foreground.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Files or directories to include in the SBOM.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<String>,

    /// Write sbom / report artifacts here instead of `scanner.artifact_dir`.
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,
}

// ---- config ----

/// Manage hexalab configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, scanner, queue, server, metrics).
        #[arg(long)]
        section: Option<String>,
    },
}
