//! # hexalab-core
//!
//! Hexalab 워크스페이스의 공통 기반 크레이트입니다.
//!
//! - [`types`]: 스캔 결과, 취약점 레코드, 작업 상태
//! - [`error`]: 최상위 에러 [`HexalabError`]와 도메인별 에러
//! - [`config`]: `hexalab.toml` 로딩과 검증
//! - [`pipeline`]: 생명주기 trait [`Pipeline`]과 스캔 실행 경계 [`ScanExecutor`]
//! - [`metrics`]: Prometheus 메트릭 이름

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, HexalabError, PipelineError, QueueError, SbomError};

// 설정
pub use config::HexalabConfig;

// 파이프라인 trait
pub use pipeline::{BoxFuture, HealthStatus, Pipeline, ScanExecutor};

// 도메인 타입
pub use types::{JobState, ScanArtifacts, ScanResult, ScanStatus, VulnerabilityRecord};
