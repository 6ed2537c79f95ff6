//! 취약점 리포트 파싱 및 정규화
//!
//! 취약점 스캐너의 JSON 출력을 타입이 있는 중간 표현([`VulnReportDocument`])으로
//! 검증한 뒤 [`VulnerabilityRecord`] 목록으로 정규화합니다.
//!
//! # 입력 형식
//!
//! ```json
//! {
//!   "matches": [
//!     {
//!       "vulnerability": { "id": "CVE-2024-1234", "severity": "High",
//!                          "dataSource": "https://...", "url": "https://..." },
//!       "artifact": { "name": "openssl", "version": "3.0.1" }
//!     }
//!   ]
//! }
//! ```
//!
//! - `matches`가 없거나 `null`이면 매칭 0건으로 취급합니다.
//! - 중첩 필드가 없거나 `null`이면 빈 문자열로 취급합니다.
//! - JSON이 아니거나 최상위가 객체가 아니거나 필드 타입이 맞지 않으면
//!   [`SbomScannerError::ReportParse`]를 반환합니다.

use std::path::Path;

use hexalab_core::types::VulnerabilityRecord;
use serde::Deserialize;

use crate::error::SbomScannerError;

/// 취약점 리포트 문서
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VulnReportDocument {
    /// 매칭 목록 (도구 출력 순서 유지)
    #[serde(default)]
    pub matches: Option<Vec<ReportMatch>>,
}

/// 하나의 (취약점, 패키지) 매칭
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportMatch {
    /// 취약점 정보
    #[serde(default)]
    pub vulnerability: Option<ReportVulnerability>,
    /// 영향받는 패키지 정보
    #[serde(default)]
    pub artifact: Option<ReportArtifact>,
}

/// 매칭의 취약점 부분
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportVulnerability {
    /// 취약점 식별자
    #[serde(default)]
    pub id: Option<String>,
    /// 심각도 라벨
    #[serde(default)]
    pub severity: Option<String>,
    /// 1순위 참조 URL
    #[serde(default, rename = "dataSource")]
    pub data_source: Option<String>,
    /// 2순위 참조 URL
    #[serde(default)]
    pub url: Option<String>,
}

/// 매칭의 패키지 부분
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportArtifact {
    /// 패키지 이름
    #[serde(default)]
    pub name: Option<String>,
    /// 패키지 버전
    #[serde(default)]
    pub version: Option<String>,
}

impl VulnReportDocument {
    /// 매칭 수
    pub fn len(&self) -> usize {
        self.matches.as_ref().map_or(0, Vec::len)
    }

    /// 매칭이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 매칭을 순서대로 [`VulnerabilityRecord`]로 변환합니다.
    pub fn into_records(self) -> Vec<VulnerabilityRecord> {
        self.matches
            .unwrap_or_default()
            .into_iter()
            .map(ReportMatch::into_record)
            .collect()
    }
}

impl ReportMatch {
    /// 매칭 하나를 레코드로 변환합니다.
    pub fn into_record(self) -> VulnerabilityRecord {
        let vulnerability = self.vulnerability.unwrap_or_default();
        let artifact = self.artifact.unwrap_or_default();
        let url = select_reference(
            vulnerability.data_source.as_deref(),
            vulnerability.url.as_deref(),
        );

        VulnerabilityRecord {
            id: vulnerability.id.unwrap_or_default(),
            package: artifact.name.unwrap_or_default(),
            version: artifact.version.unwrap_or_default(),
            severity: vulnerability.severity.unwrap_or_default(),
            url,
        }
    }
}

/// 참조 URL을 우선순위에 따라 선택합니다.
///
/// `primary`가 비어있지 않으면 `primary`, 아니면 `secondary`.
/// 빈 문자열은 값이 없는 것으로 취급합니다.
pub fn select_reference(primary: Option<&str>, secondary: Option<&str>) -> Option<String> {
    [primary, secondary]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
        .map(str::to_owned)
}

/// 리포트 바이트를 검증하고 파싱합니다.
///
/// `path`는 에러 메시지에만 사용됩니다.
pub fn parse_report(bytes: &[u8], path: &str) -> Result<VulnReportDocument, SbomScannerError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| parse_error(path, e.to_string()))?;

    if !value.is_object() {
        return Err(parse_error(path, "top-level value must be a JSON object"));
    }

    VulnReportDocument::deserialize(value).map_err(|e| parse_error(path, e.to_string()))
}

/// 리포트 파일을 읽어 레코드 목록으로 정규화합니다.
///
/// 파일이 `max_size`보다 크면 읽지 않고 `ReportParse`를 반환합니다.
pub async fn load_records(
    path: &Path,
    max_size: usize,
) -> Result<Vec<VulnerabilityRecord>, SbomScannerError> {
    let display = path.display().to_string();

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| SbomScannerError::io(path, e))?;
    if metadata.len() > max_size as u64 {
        return Err(parse_error(
            &display,
            format!("report is {} bytes (max: {max_size})", metadata.len()),
        ));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SbomScannerError::io(path, e))?;
    Ok(parse_report(&bytes, &display)?.into_records())
}

fn parse_error(path: &str, reason: impl Into<String>) -> SbomScannerError {
    SbomScannerError::ReportParse {
        path: path.to_owned(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(json: &str) -> Vec<VulnerabilityRecord> {
        parse_report(json.as_bytes(), "report.json")
            .unwrap()
            .into_records()
    }

    #[test]
    fn select_reference_prefers_primary() {
        assert_eq!(
            select_reference(Some("https://a"), Some("https://b")).as_deref(),
            Some("https://a")
        );
    }

    #[test]
    fn select_reference_treats_empty_as_absent() {
        assert_eq!(
            select_reference(Some(""), Some("https://b")).as_deref(),
            Some("https://b")
        );
        assert_eq!(select_reference(None, Some("https://b")).as_deref(), Some("https://b"));
        assert_eq!(select_reference(Some(""), Some("")), None);
        assert_eq!(select_reference(None, None), None);
    }

    #[test]
    fn missing_matches_is_zero() {
        assert!(records("{}").is_empty());
        assert!(records(r#"{"matches": null}"#).is_empty());
        assert!(records(r#"{"matches": [], "source": {"type": "sbom"}}"#).is_empty());
    }

    #[test]
    fn extracts_fields_in_order() {
        let recs = records(
            r#"{"matches": [
                {"vulnerability": {"id": "CVE-1", "severity": "Critical", "dataSource": "https://nvd/1"},
                 "artifact": {"name": "openssl", "version": "1.1.1"}},
                {"vulnerability": {"id": "CVE-2", "severity": "Low", "dataSource": "", "url": "https://x/2"},
                 "artifact": {"name": "zlib", "version": "1.2.11"}}
            ]}"#,
        );
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id, "CVE-1");
        assert_eq!(recs[0].package, "openssl");
        assert_eq!(recs[0].version, "1.1.1");
        assert_eq!(recs[0].severity, "Critical");
        assert_eq!(recs[0].url.as_deref(), Some("https://nvd/1"));
        assert_eq!(recs[1].id, "CVE-2");
        assert_eq!(recs[1].url.as_deref(), Some("https://x/2"));
    }

    #[test]
    fn missing_nested_fields_default_to_empty() {
        let recs = records(r#"{"matches": [{}, {"vulnerability": null, "artifact": {"name": "a"}}]}"#);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id, "");
        assert_eq!(recs[0].package, "");
        assert!(recs[0].url.is_none());
        assert_eq!(recs[1].package, "a");
        assert_eq!(recs[1].version, "");
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = parse_report(b"not json", "cve_report.json").unwrap_err();
        match err {
            SbomScannerError::ReportParse { path, .. } => assert_eq!(path, "cve_report.json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_object_top_level_is_parse_error() {
        assert!(parse_report(b"[]", "r.json").is_err());
        assert!(parse_report(b"[[]]", "r.json").is_err());
        assert!(parse_report(b"\"matches\"", "r.json").is_err());
    }

    #[test]
    fn wrong_field_type_is_parse_error() {
        assert!(parse_report(br#"{"matches": {}}"#, "r.json").is_err());
        assert!(parse_report(br#"{"matches": [{"vulnerability": {"id": 7}}]}"#, "r.json").is_err());
    }

    #[tokio::test]
    async fn load_records_rejects_oversized_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cve_report.json");
        tokio::fs::write(&path, br#"{"matches": []}"#).await.unwrap();

        let err = load_records(&path, 4).await.unwrap_err();
        assert!(matches!(err, SbomScannerError::ReportParse { .. }));

        let recs = load_records(&path, 1024).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn load_records_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(&dir.path().join("absent.json"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, SbomScannerError::Io { .. }));
    }
}
