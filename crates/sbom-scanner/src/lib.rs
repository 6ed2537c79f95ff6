//! # hexalab-sbom-scanner
//!
//! 외부 SBOM 생성기와 취약점 스캐너를 서브프로세스로 실행하고,
//! 취약점 리포트를 [`ScanResult`](hexalab_core::types::ScanResult)로 집계합니다.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`SbomScannerError`)
//! - [`config`]: Scanner configuration (`SbomScannerConfig`, builder)
//! - [`tool`]: External tool adapter (`ToolRunner` trait, `ProcessToolRunner`)
//! - [`report`]: Typed vulnerability report IR and normalization
//! - [`pipeline`]: Scan orchestration (`ScanPipeline`, `ArtifactLayout`, `ScanExecutor` impl)
//!
//! # Architecture
//!
//! ```text
//! files --> generate_sbom --(sbom tool)--> sbom.cdx.json
//!                                               |
//!            scan_for_vulnerabilities --(vuln tool, sbom:<path>)--> cve_report.json
//!                                                                        |
//!                                              report::parse_report --> ScanResult
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod tool;

// --- Public API Re-exports ---

// Pipeline
pub use pipeline::{ArtifactLayout, REPORT_FILE_NAME, SBOM_FILE_NAME, ScanPipeline};

// Configuration
pub use config::{SbomScannerConfig, SbomScannerConfigBuilder};

// Error
pub use error::SbomScannerError;

// Tool adapter
pub use tool::{ProcessToolRunner, ToolRunner};

// Report
pub use report::{VulnReportDocument, parse_report, select_reference};
