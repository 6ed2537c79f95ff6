//! 에러 타입: 도메인별 에러 정의
//!
//! 각 모듈 크레이트(`hexalab-sbom-scanner`, `hexalab-job-queue`)는 자체 에러를
//! 정의하고 `From` 구현으로 [`HexalabError`]로 변환합니다.

/// Hexalab 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum HexalabError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// SBOM 생성 / CVE 스캔 에러
    #[error("sbom error: {0}")]
    Sbom(#[from] SbomError),

    /// 작업 큐 에러
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline not running")]
    NotRunning,
}

/// SBOM 생성 / CVE 스캔 에러
///
/// 외부 도구 실행 실패의 분류를 유지한 채 상위로 전달합니다.
#[derive(Debug, thiserror::Error)]
pub enum SbomError {
    /// 입력 파일 없음 등 호출자 입력 오류
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 외부 도구를 찾거나 실행할 수 없음
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// 외부 도구가 실패 종료
    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    /// 도구 출력 파싱 실패
    #[error("report parse failed: {0}")]
    ReportParse(String),

    /// 기타 스캔 실패
    #[error("scan failed: {0}")]
    ScanFailed(String),
}

/// 작업 큐 에러
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// 제출 거부 (입력 검증 실패)
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// 조회 실패 (미등록 / 미완료 / 실패한 작업)
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// 큐 용량 초과 또는 종료
    #[error("queue unavailable: {0}")]
    Unavailable(String),
}
