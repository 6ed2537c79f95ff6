//! 설정 관리: hexalab.toml 파싱 및 런타임 설정
//!
//! [`HexalabConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`HEXALAB_QUEUE_WORKERS=4` 형식)
//! 3. 설정 파일 (`hexalab.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), hexalab_core::error::HexalabError> {
//! use hexalab_core::config::HexalabConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = HexalabConfig::load("hexalab.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HexalabConfig::parse("[queue]\nworkers = 4")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HexalabError};

/// Hexalab 통합 설정
///
/// `hexalab.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HexalabConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 외부 스캐너 도구 설정
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// 작업 큐 설정
    #[serde(default)]
    pub queue: QueueSection,
    /// HTTP 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl HexalabConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HexalabError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HexalabError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HexalabError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HexalabError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HexalabError> {
        toml::from_str(toml_str).map_err(|e| {
            HexalabError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `HEXALAB_{SECTION}_{FIELD}`
    /// 예: `HEXALAB_SCANNER_SBOM_TOOL_PATH=/opt/bin/syft`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "HEXALAB_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "HEXALAB_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "HEXALAB_GENERAL_DATA_DIR");

        // Scanner
        override_string(
            &mut self.scanner.sbom_tool_path,
            "HEXALAB_SCANNER_SBOM_TOOL_PATH",
        );
        override_string(
            &mut self.scanner.vuln_tool_path,
            "HEXALAB_SCANNER_VULN_TOOL_PATH",
        );
        override_string(
            &mut self.scanner.sbom_output_format,
            "HEXALAB_SCANNER_SBOM_OUTPUT_FORMAT",
        );
        override_string(
            &mut self.scanner.report_output_format,
            "HEXALAB_SCANNER_REPORT_OUTPUT_FORMAT",
        );
        override_string(
            &mut self.scanner.sbom_uri_scheme,
            "HEXALAB_SCANNER_SBOM_URI_SCHEME",
        );
        override_string(&mut self.scanner.artifact_dir, "HEXALAB_SCANNER_ARTIFACT_DIR");
        override_u64(
            &mut self.scanner.tool_timeout_secs,
            "HEXALAB_SCANNER_TOOL_TIMEOUT_SECS",
        );

        // Queue
        override_usize(&mut self.queue.workers, "HEXALAB_QUEUE_WORKERS");
        override_usize(&mut self.queue.capacity, "HEXALAB_QUEUE_CAPACITY");
        override_u64(&mut self.queue.retention_secs, "HEXALAB_QUEUE_RETENTION_SECS");
        override_u64(
            &mut self.queue.shutdown_timeout_secs,
            "HEXALAB_QUEUE_SHUTDOWN_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.queue.restrict_to_data_dir,
            "HEXALAB_QUEUE_RESTRICT_TO_DATA_DIR",
        );

        // Server
        override_string(&mut self.server.listen_addr, "HEXALAB_SERVER_LISTEN_ADDR");
        override_u16(&mut self.server.port, "HEXALAB_SERVER_PORT");
        override_csv(&mut self.server.cors_origins, "HEXALAB_SERVER_CORS_ORIGINS");
        override_usize(
            &mut self.server.max_upload_bytes,
            "HEXALAB_SERVER_MAX_UPLOAD_BYTES",
        );
        override_string(&mut self.server.upload_dir, "HEXALAB_SERVER_UPLOAD_DIR");

        // Metrics
        override_bool(&mut self.metrics.enabled, "HEXALAB_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "HEXALAB_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "HEXALAB_METRICS_PORT");
        override_string(&mut self.metrics.endpoint, "HEXALAB_METRICS_ENDPOINT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HexalabError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty", "compact"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.general.data_dir.is_empty() {
            return Err(invalid("general.data_dir", "must not be empty"));
        }

        // 도구 경로: 검색 경로에 의존하지 않도록 절대 경로만 허용
        for (field, value) in [
            ("scanner.sbom_tool_path", &self.scanner.sbom_tool_path),
            ("scanner.vuln_tool_path", &self.scanner.vuln_tool_path),
        ] {
            if !Path::new(value).is_absolute() {
                return Err(invalid(field, "must be an absolute path"));
            }
        }

        for (field, value) in [
            ("scanner.sbom_output_format", &self.scanner.sbom_output_format),
            (
                "scanner.report_output_format",
                &self.scanner.report_output_format,
            ),
            ("scanner.sbom_uri_scheme", &self.scanner.sbom_uri_scheme),
            ("scanner.artifact_dir", &self.scanner.artifact_dir),
        ] {
            if value.is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        if self.queue.workers == 0 {
            return Err(invalid("queue.workers", "must be greater than 0"));
        }
        if self.queue.capacity == 0 {
            return Err(invalid("queue.capacity", "must be greater than 0"));
        }

        if self.server.listen_addr.is_empty() {
            return Err(invalid("server.listen_addr", "must not be empty"));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(invalid("server.max_upload_bytes", "must be greater than 0"));
        }
        if self.server.upload_dir.is_empty() {
            return Err(invalid("server.upload_dir", "must not be empty"));
        }
        // 업로드 파일도 스캔 대상이므로 제출 경로 제한을 통과해야 함
        if self.queue.restrict_to_data_dir {
            let upload_dir = Path::new(&self.server.upload_dir);
            if !upload_dir.is_absolute() {
                return Err(invalid(
                    "server.upload_dir",
                    "must be an absolute path when queue.restrict_to_data_dir is set",
                ));
            }
            if !upload_dir.starts_with(&self.general.data_dir) {
                return Err(invalid(
                    "server.upload_dir",
                    format!(
                        "must be inside general.data_dir ({}) when queue.restrict_to_data_dir is set",
                        self.general.data_dir
                    ),
                ));
            }
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(invalid(
                    "metrics.port",
                    "must be non-zero when metrics are enabled",
                ));
            }
            if !self.metrics.endpoint.starts_with('/') {
                return Err(invalid("metrics.endpoint", "must start with '/'"));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> HexalabError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty, compact)
    pub log_format: String,
    /// 데이터 루트 디렉토리 (스캔 대상 파일은 이 아래에 있어야 함)
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "/data".to_owned(),
        }
    }
}

/// 외부 스캐너 도구 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// SBOM 생성 도구 절대 경로
    pub sbom_tool_path: String,
    /// 취약점 스캐너 절대 경로
    pub vuln_tool_path: String,
    /// SBOM 생성 도구 `-o` 인자
    pub sbom_output_format: String,
    /// 취약점 스캐너 `-o` 인자
    pub report_output_format: String,
    /// 취약점 스캐너에 SBOM을 넘길 때 사용하는 스킴 (`<scheme>:<path>`)
    pub sbom_uri_scheme: String,
    /// 스캔 산출물 디렉토리
    pub artifact_dir: String,
    /// 도구 실행 타임아웃 (초, 0이면 비활성)
    pub tool_timeout_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            sbom_tool_path: "/usr/local/bin/syft".to_owned(),
            vuln_tool_path: "/usr/local/bin/grype".to_owned(),
            sbom_output_format: "cyclonedx-json".to_owned(),
            report_output_format: "json".to_owned(),
            sbom_uri_scheme: "sbom".to_owned(),
            artifact_dir: "/data".to_owned(),
            tool_timeout_secs: 0,
        }
    }
}

/// 작업 큐 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSection {
    /// 워커 수
    pub workers: usize,
    /// 대기열 최대 길이
    pub capacity: usize,
    /// 종료 상태 작업 보존 기간 (초, 0이면 영구 보존)
    pub retention_secs: u64,
    /// 종료 시 실행 중 작업 대기 시간 (초)
    pub shutdown_timeout_secs: u64,
    /// 제출 경로를 `general.data_dir` 아래로 제한할지 여부
    pub restrict_to_data_dir: bool,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            workers: 2,
            capacity: 256,
            retention_secs: 0,
            shutdown_timeout_secs: 30,
            restrict_to_data_dir: true,
        }
    }
}

/// HTTP 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// CORS 허용 origin 목록
    pub cors_origins: Vec<String>,
    /// 업로드 최대 크기 (바이트)
    pub max_upload_bytes: usize,
    /// 업로드 파일 저장 디렉토리
    pub upload_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_owned(),
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_owned()],
            max_upload_bytes: 100 * 1024 * 1024, // 100MB
            upload_dir: "/data/uploads".to_owned(),
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
