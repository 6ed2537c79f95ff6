//! `hexalab scan` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use hexalab_core::config::HexalabConfig;
use hexalab_core::types::{ScanResult, VulnerabilityRecord};
use hexalab_sbom_scanner::{ArtifactLayout, SbomScannerConfig, ScanPipeline};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
///
/// Runs the pipeline in the foreground against the configured tools. Exits
/// with [`CliError::VulnerabilitiesFound`] when the report is not empty.
pub async fn execute(
    args: ScanArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_or_default(config_path).await?;

    let scanner_config = SbomScannerConfig::from_core(&config.scanner);
    let pipeline = ScanPipeline::from_config(scanner_config)?;

    info!(files = args.files.len(), "starting one-shot scan");

    let result = match &args.artifact_dir {
        Some(dir) => {
            pipeline
                .run_full_scan(&ArtifactLayout::new(dir), &args.files)
                .await?
        }
        None => pipeline.run_full_scan_default(&args.files).await?,
    };
    let report = ScanReport::new(args.files, result);

    writer.render(&report)?;

    if report.total_vulns > 0 {
        return Err(CliError::VulnerabilitiesFound(report.total_vulns));
    }

    Ok(())
}

/// Load the config file, falling back to defaults (plus env overrides) when it does not exist.
async fn load_or_default(config_path: &Path) -> Result<HexalabConfig, CliError> {
    if tokio::fs::try_exists(config_path).await.unwrap_or(false) {
        return Ok(HexalabConfig::load(config_path).await?);
    }

    warn!(
        path = %config_path.display(),
        "config file not found, using defaults"
    );
    let mut config = HexalabConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

#[derive(Serialize)]
pub struct ScanReport {
    pub files: Vec<String>,
    pub summary: String,
    pub total_vulns: usize,
    pub critical: usize,
    pub high: usize,
    pub sbom_file: Option<String>,
    pub cve_file: Option<String>,
    pub findings: Vec<VulnerabilityRecord>,
}

impl ScanReport {
    fn new(files: Vec<String>, result: ScanResult) -> Self {
        let (sbom_file, cve_file) = match result.artifacts {
            Some(artifacts) => (Some(artifacts.sbom_file), Some(artifacts.cve_file)),
            None => (None, None),
        };
        Self {
            files,
            summary: result.summary,
            total_vulns: result.total_vulns,
            critical: result.critical,
            high: result.high,
            sbom_file,
            cve_file,
            findings: result.vulnerabilities,
        }
    }
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scan: {}", self.files.join(", ").bold())?;
        if let Some(sbom) = &self.sbom_file {
            writeln!(w, "SBOM: {}", sbom)?;
        }
        if let Some(report) = &self.cve_file {
            writeln!(w, "Report: {}", report)?;
        }
        writeln!(w)?;

        let counts = format!(
            "{} (critical: {}, high: {})",
            self.summary, self.critical, self.high
        );
        if self.total_vulns > 0 {
            writeln!(w, "Vulnerabilities: {}", counts.red().bold())?;
        } else {
            writeln!(w, "Vulnerabilities: {}", counts.green().bold())?;
        }

        writeln!(w)?;

        if self.findings.is_empty() {
            writeln!(w, "{}", "No vulnerabilities found.".green())?;
            return Ok(());
        }

        writeln!(
            w,
            "{:<20} {:<10} {:<25} {:<12} URL",
            "ID", "Severity", "Package", "Version"
        )?;
        writeln!(w, "{}", "-".repeat(80))?;

        for f in &self.findings {
            let severity_colored = match f.severity.as_str() {
                "Critical" => f.severity.red().bold(),
                "High" => f.severity.red(),
                "Medium" => f.severity.yellow(),
                "Negligible" | "Unknown" => f.severity.dimmed(),
                _ => f.severity.normal(),
            };

            writeln!(
                w,
                "{:<20} {:<10} {:<25} {:<12} {}",
                f.id,
                severity_colored,
                f.package,
                f.version,
                f.url.as_deref().unwrap_or("N/A")
            )?;
        }

        Ok(())
    }
}
