//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 스캐너, 작업 큐, HTTP façade, CLI가 공유하는 데이터 구조를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 집계 대상 심각도 라벨 (외부 도구 어휘 그대로, 대소문자 구분)
pub const SEVERITY_CRITICAL: &str = "Critical";
/// 집계 대상 심각도 라벨 (외부 도구 어휘 그대로, 대소문자 구분)
pub const SEVERITY_HIGH: &str = "High";

/// 취약점 레코드
///
/// 하나의 (취약점, 패키지) 매칭을 나타냅니다. 같은 CVE가 여러 패키지에
/// 영향을 주면 레코드도 여러 개 생성됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// 취약점 식별자 (예: CVE-2024-1234, GHSA-xxxx)
    pub id: String,
    /// 영향받는 패키지 이름
    pub package: String,
    /// 영향받는 패키지 버전
    pub version: String,
    /// 심각도 라벨 (외부 도구의 자유 형식 문자열)
    pub severity: String,
    /// 참조 URL
    pub url: Option<String>,
}

impl VulnerabilityRecord {
    /// 심각도가 정확히 `"Critical"`인지 여부
    pub fn is_critical(&self) -> bool {
        self.severity == SEVERITY_CRITICAL
    }

    /// 심각도가 정확히 `"High"`인지 여부
    pub fn is_high(&self) -> bool {
        self.severity == SEVERITY_HIGH
    }
}

impl fmt::Display for VulnerabilityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}@{}",
            self.id, self.severity, self.package, self.version
        )
    }
}

/// 스캔 산출물 경로
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanArtifacts {
    /// SBOM 파일 경로
    pub sbom_file: String,
    /// CVE 리포트 파일 경로
    pub cve_file: String,
}

/// 스캔 결과
///
/// 성공한 작업마다 한 번 생성되는 불변 값입니다. [`ScanResult::from_records`]로만
/// 생성하며, 집계 값은 항상 레코드 목록에서 계산됩니다.
///
/// # 불변식
///
/// - `total_vulns == vulnerabilities.len()`
/// - `critical`, `high`는 각각 해당 심각도 레코드 수
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// 전체 취약점 수
    pub total_vulns: usize,
    /// Critical 취약점 수
    pub critical: usize,
    /// High 취약점 수
    pub high: usize,
    /// 사람이 읽을 수 있는 요약
    pub summary: String,
    /// 취약점 목록 (도구 출력 순서 유지)
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    /// 결과를 만든 산출물 경로
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ScanArtifacts>,
}

impl ScanResult {
    /// 레코드 목록에서 집계 값을 계산해 결과를 생성합니다.
    ///
    /// `"Critical"`, `"High"` 이외의 라벨은 목록에는 남지만 별도로 집계하지 않습니다.
    pub fn from_records(
        vulnerabilities: Vec<VulnerabilityRecord>,
        artifacts: Option<ScanArtifacts>,
    ) -> Self {
        let total_vulns = vulnerabilities.len();
        let critical = vulnerabilities.iter().filter(|v| v.is_critical()).count();
        let high = vulnerabilities.iter().filter(|v| v.is_high()).count();

        Self {
            total_vulns,
            critical,
            high,
            summary: format!("{total_vulns} CVEs detected"),
            vulnerabilities,
            artifacts,
        }
    }

    /// 취약점이 하나도 없는 빈 결과
    pub fn empty() -> Self {
        Self::from_records(Vec::new(), None)
    }

    /// 취약점 발견 여부
    pub fn has_vulnerabilities(&self) -> bool {
        self.total_vulns > 0
    }
}

/// 작업 생명주기 상태 라벨
///
/// `Queued -> Running -> Succeeded | Failed`. 종료 상태에서는 전이하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// 제출됨, 워커 대기 중
    Queued,
    /// 워커가 실행 중
    Running,
    /// 성공 종료 (결과 있음)
    Succeeded,
    /// 실패 종료 (실패 사유 있음)
    Failed,
}

impl JobState {
    /// 상태 라벨 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// 종료 상태인지 여부
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 작업 상태 조회 결과
///
/// 조회 시점에 작업에서 계산되며 따로 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatus {
    /// 작업 ID
    pub job_id: String,
    /// 현재 상태
    pub status: JobState,
    /// 부가 정보 (실패 사유 등)
    pub detail: Option<String>,
}
