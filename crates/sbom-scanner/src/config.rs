//! SBOM 스캐너 설정
//!
//! [`SbomScannerConfig`]는 core의 [`ScannerConfig`](hexalab_core::config::ScannerConfig)를
//! 확장하여 스캐너 고유 설정(리포트 크기 제한)을 추가합니다.
//!
//! # 사용 예시
//!
//! ```
//! use hexalab_sbom_scanner::SbomScannerConfig;
//!
//! // 기본값으로 생성
//! let config = SbomScannerConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! use hexalab_sbom_scanner::SbomScannerConfigBuilder;
//!
//! let config = SbomScannerConfigBuilder::new()
//!     .sbom_tool_path("/opt/tools/syft")
//!     .tool_timeout_secs(600)
//!     .build()
//!     .unwrap();
//! ```

use std::path::{Component, Path};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SbomScannerError;

/// SBOM 스캐너 설정
///
/// # 필드
///
/// - **sbom_tool_path** / **vuln_tool_path**: 외부 도구 절대 경로
/// - **sbom_output_format** / **report_output_format**: 각 도구의 `-o` 인자
/// - **sbom_uri_scheme**: 취약점 스캐너 입력 접두어 (`sbom:<path>`)
/// - **artifact_dir**: 산출물 루트 디렉토리
/// - **tool_timeout_secs**: 도구 실행 타임아웃 (0이면 비활성)
/// - **max_report_size**: 파싱할 리포트 최대 크기 (바이트)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbomScannerConfig {
    /// SBOM 생성 도구 절대 경로
    pub sbom_tool_path: String,
    /// 취약점 스캐너 절대 경로
    pub vuln_tool_path: String,
    /// SBOM 생성 도구 출력 형식
    pub sbom_output_format: String,
    /// 취약점 스캐너 출력 형식
    pub report_output_format: String,
    /// 취약점 스캐너에 SBOM을 넘길 때의 스킴
    pub sbom_uri_scheme: String,
    /// 산출물 루트 디렉토리
    pub artifact_dir: String,
    /// 도구 실행 타임아웃 (초). 0이면 타임아웃 없음
    pub tool_timeout_secs: u64,

    // --- 모듈 고유 확장 ---
    /// 파싱할 취약점 리포트 최대 크기 (바이트)
    pub max_report_size: usize,
}

impl Default for SbomScannerConfig {
    fn default() -> Self {
        Self::from_core(&hexalab_core::config::ScannerConfig::default())
    }
}

/// 설정 상한값 상수
const MAX_TOOL_TIMEOUT_SECS: u64 = 86_400; // 24 hours
const MAX_REPORT_SIZE: usize = 1024 * 1024 * 1024; // 1 GB
const DEFAULT_MAX_REPORT_SIZE: usize = 256 * 1024 * 1024; // 256 MB
const MAX_PATH_LEN: usize = 4096;

impl SbomScannerConfig {
    /// core의 `ScannerConfig`에서 스캐너 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값을 사용합니다.
    pub fn from_core(core: &hexalab_core::config::ScannerConfig) -> Self {
        Self {
            sbom_tool_path: core.sbom_tool_path.clone(),
            vuln_tool_path: core.vuln_tool_path.clone(),
            sbom_output_format: core.sbom_output_format.clone(),
            report_output_format: core.report_output_format.clone(),
            sbom_uri_scheme: core.sbom_uri_scheme.clone(),
            artifact_dir: core.artifact_dir.clone(),
            tool_timeout_secs: core.tool_timeout_secs,
            max_report_size: DEFAULT_MAX_REPORT_SIZE,
        }
    }

    /// 도구 실행 타임아웃. 0이면 `None`
    pub fn tool_timeout(&self) -> Option<Duration> {
        (self.tool_timeout_secs > 0).then(|| Duration::from_secs(self.tool_timeout_secs))
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - 도구 경로: 절대 경로, `..` 금지
    /// - 출력 형식 / 스킴 / 산출물 디렉토리: 비어있으면 안 됨
    /// - `sbom_uri_scheme`: `:` 포함 금지
    /// - `tool_timeout_secs`: 0-86400
    /// - `max_report_size`: 1-1073741824 (1GB)
    pub fn validate(&self) -> Result<(), SbomScannerError> {
        for (field, value) in [
            ("sbom_tool_path", &self.sbom_tool_path),
            ("vuln_tool_path", &self.vuln_tool_path),
        ] {
            validate_path(field, value)?;
            if !Path::new(value).is_absolute() {
                return Err(config_err(field, format!("'{value}' must be an absolute path")));
            }
        }

        validate_path("artifact_dir", &self.artifact_dir)?;

        for (field, value) in [
            ("sbom_output_format", &self.sbom_output_format),
            ("report_output_format", &self.report_output_format),
            ("sbom_uri_scheme", &self.sbom_uri_scheme),
        ] {
            if value.trim().is_empty() {
                return Err(config_err(field, "must not be empty"));
            }
        }

        if self.sbom_uri_scheme.contains(':') {
            return Err(config_err(
                "sbom_uri_scheme",
                "must not contain ':' (it is appended automatically)",
            ));
        }

        if self.tool_timeout_secs > MAX_TOOL_TIMEOUT_SECS {
            return Err(config_err(
                "tool_timeout_secs",
                format!("must be 0 (disabled) or 1-{MAX_TOOL_TIMEOUT_SECS}"),
            ));
        }

        if self.max_report_size == 0 || self.max_report_size > MAX_REPORT_SIZE {
            return Err(config_err(
                "max_report_size",
                format!("must be 1-{MAX_REPORT_SIZE}"),
            ));
        }

        Ok(())
    }
}

fn config_err(field: &str, reason: impl Into<String>) -> SbomScannerError {
    SbomScannerError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

fn validate_path(field: &str, value: &str) -> Result<(), SbomScannerError> {
    if value.is_empty() {
        return Err(config_err(field, "path must not be empty"));
    }

    if Path::new(value)
        .components()
        .any(|c| c == Component::ParentDir)
    {
        return Err(config_err(
            field,
            format!("'{value}' contains path traversal pattern '..'"),
        ));
    }

    if value.len() > MAX_PATH_LEN {
        return Err(config_err(
            field,
            format!("path exceeds maximum length {MAX_PATH_LEN}"),
        ));
    }

    Ok(())
}

/// [`SbomScannerConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct SbomScannerConfigBuilder {
    config: SbomScannerConfig,
}

impl SbomScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// SBOM 생성 도구 경로를 설정합니다.
    pub fn sbom_tool_path(mut self, path: impl Into<String>) -> Self {
        self.config.sbom_tool_path = path.into();
        self
    }

    /// 취약점 스캐너 경로를 설정합니다.
    pub fn vuln_tool_path(mut self, path: impl Into<String>) -> Self {
        self.config.vuln_tool_path = path.into();
        self
    }

    /// SBOM 출력 형식을 설정합니다.
    pub fn sbom_output_format(mut self, format: impl Into<String>) -> Self {
        self.config.sbom_output_format = format.into();
        self
    }

    /// 취약점 리포트 출력 형식을 설정합니다.
    pub fn report_output_format(mut self, format: impl Into<String>) -> Self {
        self.config.report_output_format = format.into();
        self
    }

    /// SBOM URI 스킴을 설정합니다.
    pub fn sbom_uri_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.sbom_uri_scheme = scheme.into();
        self
    }

    /// 산출물 디렉토리를 설정합니다.
    pub fn artifact_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.artifact_dir = dir.into();
        self
    }

    /// 도구 실행 타임아웃(초)을 설정합니다.
    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = secs;
        self
    }

    /// 리포트 최대 크기(바이트)를 설정합니다.
    pub fn max_report_size(mut self, size: usize) -> Self {
        self.config.max_report_size = size;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `SbomScannerError::Config` 반환
    pub fn build(self) -> Result<SbomScannerConfig, SbomScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SbomScannerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sbom_tool_path, "/usr/local/bin/syft");
        assert_eq!(config.vuln_tool_path, "/usr/local/bin/grype");
        assert!(config.tool_timeout().is_none());
    }

    #[test]
    fn from_core_preserves_values() {
        let core = hexalab_core::config::ScannerConfig {
            sbom_tool_path: "/opt/bin/syft".to_owned(),
            vuln_tool_path: "/opt/bin/grype".to_owned(),
            sbom_output_format: "spdx-json".to_owned(),
            report_output_format: "json".to_owned(),
            sbom_uri_scheme: "sbom".to_owned(),
            artifact_dir: "/srv/artifacts".to_owned(),
            tool_timeout_secs: 300,
        };
        let config = SbomScannerConfig::from_core(&core);
        assert_eq!(config.sbom_tool_path, "/opt/bin/syft");
        assert_eq!(config.sbom_output_format, "spdx-json");
        assert_eq!(config.artifact_dir, "/srv/artifacts");
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(300)));
        // 확장 필드는 기본값
        assert_eq!(config.max_report_size, DEFAULT_MAX_REPORT_SIZE);
    }

    #[test]
    fn validate_rejects_relative_tool_path() {
        let config = SbomScannerConfig {
            vuln_tool_path: "grype".to_owned(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("vuln_tool_path"));
    }

    #[test]
    fn validate_rejects_traversal_in_artifact_dir() {
        let config = SbomScannerConfig {
            artifact_dir: "/data/../etc".to_owned(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_scheme_with_colon() {
        let config = SbomScannerConfig {
            sbom_uri_scheme: "sbom:".to_owned(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_format() {
        let config = SbomScannerConfig {
            sbom_output_format: "  ".to_owned(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_too_large_timeout() {
        let config = SbomScannerConfig {
            tool_timeout_secs: MAX_TOOL_TIMEOUT_SECS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_report_size() {
        let config = SbomScannerConfig {
            max_report_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_all_setters() {
        let config = SbomScannerConfigBuilder::new()
            .sbom_tool_path("/opt/syft")
            .vuln_tool_path("/opt/grype")
            .sbom_output_format("syft-json")
            .report_output_format("json")
            .sbom_uri_scheme("sbom")
            .artifact_dir("/tmp/artifacts")
            .tool_timeout_secs(120)
            .max_report_size(1024)
            .build()
            .unwrap();

        assert_eq!(config.sbom_tool_path, "/opt/syft");
        assert_eq!(config.vuln_tool_path, "/opt/grype");
        assert_eq!(config.sbom_output_format, "syft-json");
        assert_eq!(config.artifact_dir, "/tmp/artifacts");
        assert_eq!(config.tool_timeout_secs, 120);
        assert_eq!(config.max_report_size, 1024);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = SbomScannerConfigBuilder::new().sbom_tool_path("syft").build();
        assert!(result.is_err());
    }
}
