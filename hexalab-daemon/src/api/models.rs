//! Request and response bodies for the scan API.

use serde::{Deserialize, Serialize};

use hexalab_core::types::{JobState, ScanResult, VulnerabilityRecord};

/// `POST /scan` request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanRequest {
    /// Absolute paths of the files to scan.
    pub target_files: Vec<String>,
}

/// Response for an accepted submission.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanQueued {
    pub job_id: String,
    pub status: JobState,
}

impl ScanQueued {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobState::Queued,
        }
    }
}

/// `GET /scan/{job_id}/report` response body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanReport {
    pub job_id: String,
    pub summary: String,
    pub total_vulns: usize,
    pub critical: usize,
    pub high: usize,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
}

impl ScanReport {
    pub fn from_result(job_id: &str, result: ScanResult) -> Self {
        Self {
            job_id: job_id.to_owned(),
            summary: result.summary,
            total_vulns: result.total_vulns,
            critical: result.critical,
            high: result.high,
            vulnerabilities: result.vulnerabilities,
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable detail.
    pub detail: String,
}
