//! SBOM 스캐너 에러 타입
//!
//! [`SbomScannerError`]는 외부 도구 실행과 스캔 파이프라인에서 발생할 수 있는
//! 모든 에러를 나타냅니다. `From<SbomScannerError> for HexalabError` 구현을 통해
//! `?` 연산자로 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **입력**: `InvalidInput`
//! - **외부 도구**: `ToolNotFound`, `ToolExecution`, `ToolTimeout`
//! - **리포트 파싱**: `ReportParse`
//! - **설정**: `Config`
//! - **파일 I/O**: `Io`

use hexalab_core::error::{HexalabError, SbomError};

/// SBOM 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SbomScannerError {
    /// 호출자 입력 오류 (빈 파일 목록 등). 외부 도구는 실행되지 않습니다.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 외부 도구를 찾거나 실행할 수 없음
    #[error("tool not found: {tool}: {reason}")]
    ToolNotFound {
        /// 도구 실행 파일 경로
        tool: String,
        /// 실패 사유
        reason: String,
    },

    /// 외부 도구가 0이 아닌 코드로 종료
    ///
    /// 도구의 진단 출력은 `output_path`에 남아 있습니다.
    #[error("{tool} failed with {}; output in {output_path}", exit_label(*.exit_code))]
    ToolExecution {
        /// 도구 실행 파일 경로
        tool: String,
        /// 종료 코드 (시그널로 종료되면 `None`)
        exit_code: Option<i32>,
        /// 결합된 stdout/stderr가 기록된 파일
        output_path: String,
    },

    /// 외부 도구 실행 시간 초과
    #[error("{tool} timed out after {timeout_secs}s")]
    ToolTimeout {
        /// 도구 실행 파일 경로
        tool: String,
        /// 적용된 타임아웃 (초)
        timeout_secs: u64,
    },

    /// 취약점 리포트 파싱 실패
    #[error("report parse error: {path}: {reason}")]
    ReportParse {
        /// 리포트 파일 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "signal".to_owned(),
    }
}

impl SbomScannerError {
    /// I/O 에러에 경로 정보를 붙입니다.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<SbomScannerError> for HexalabError {
    fn from(err: SbomScannerError) -> Self {
        let msg = err.to_string();
        let sbom = match err {
            SbomScannerError::InvalidInput(reason) => SbomError::InvalidInput(reason),
            SbomScannerError::ToolNotFound { .. } => SbomError::ToolNotFound(msg),
            SbomScannerError::ToolExecution { .. } | SbomScannerError::ToolTimeout { .. } => {
                SbomError::ToolExecution(msg)
            }
            SbomScannerError::ReportParse { .. } => SbomError::ReportParse(msg),
            SbomScannerError::Config { .. } | SbomScannerError::Io { .. } => {
                SbomError::ScanFailed(msg)
            }
        };
        HexalabError::Sbom(sbom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_execution_display_includes_exit_code_and_output() {
        let err = SbomScannerError::ToolExecution {
            tool: "/usr/local/bin/syft".to_owned(),
            exit_code: Some(1),
            output_path: "/data/sbom.cdx.json".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/usr/local/bin/syft"));
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("/data/sbom.cdx.json"));
    }

    #[test]
    fn tool_execution_display_signal() {
        let err = SbomScannerError::ToolExecution {
            tool: "grype".to_owned(),
            exit_code: None,
            output_path: "out.json".to_owned(),
        };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn tool_not_found_display() {
        let err = SbomScannerError::ToolNotFound {
            tool: "/opt/missing".to_owned(),
            reason: "No such file or directory".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/opt/missing"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn report_parse_display() {
        let err = SbomScannerError::ReportParse {
            path: "cve_report.json".to_owned(),
            reason: "expected value at line 1".to_owned(),
        };
        assert!(err.to_string().contains("cve_report.json"));
    }

    #[test]
    fn converts_to_hexalab_error_by_category() {
        let invalid: HexalabError = SbomScannerError::InvalidInput("no files".to_owned()).into();
        assert!(matches!(
            invalid,
            HexalabError::Sbom(SbomError::InvalidInput(_))
        ));

        let exec: HexalabError = SbomScannerError::ToolTimeout {
            tool: "syft".to_owned(),
            timeout_secs: 30,
        }
        .into();
        assert!(matches!(exec, HexalabError::Sbom(SbomError::ToolExecution(_))));
        assert!(exec.to_string().contains("timed out after 30s"));

        let parse: HexalabError = SbomScannerError::ReportParse {
            path: "r.json".to_owned(),
            reason: "bad".to_owned(),
        }
        .into();
        assert!(matches!(parse, HexalabError::Sbom(SbomError::ReportParse(_))));
    }

    #[test]
    fn io_helper_keeps_path() {
        let err = SbomScannerError::io(
            "/data/job/sbom.cdx.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let hexalab: HexalabError = err.into();
        assert!(hexalab.to_string().contains("/data/job/sbom.cdx.json"));
    }
}
