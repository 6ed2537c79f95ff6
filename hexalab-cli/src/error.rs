//! CLI-specific error types and exit code mapping

use hexalab_core::error::HexalabError;
use hexalab_sbom_scanner::SbomScannerError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from hexalab-core.
    #[error("{0}")]
    Core(HexalabError),

    /// The scan pipeline itself failed (tool missing, tool exit, bad report).
    #[error("scan error: {0}")]
    Scan(String),

    /// The scan succeeded and found vulnerabilities.
    #[error("found {0} vulnerabilities")]
    VulnerabilitiesFound(usize),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                              |
    /// |------|--------------------------------------|
    /// | 0    | Success                              |
    /// | 1    | General / command / scan failure     |
    /// | 2    | Configuration error                  |
    /// | 4    | Scan found vulnerabilities           |
    /// | 10   | IO error                             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::VulnerabilitiesFound(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) | Self::Scan(_) => 1,
        }
    }
}

impl From<HexalabError> for CliError {
    fn from(e: HexalabError) -> Self {
        match e {
            HexalabError::Config(inner) => Self::Config(inner.to_string()),
            HexalabError::Io(inner) => Self::Io(inner),
            other => Self::Core(other),
        }
    }
}

impl From<SbomScannerError> for CliError {
    fn from(e: SbomScannerError) -> Self {
        match e {
            SbomScannerError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Scan(other.to_string()),
        }
    }
}
