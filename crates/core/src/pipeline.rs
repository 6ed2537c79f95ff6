//! 파이프라인 trait: 모듈 확장 포인트 정의
//!
//! - [`Pipeline`]: 백그라운드 컴포넌트의 생명주기 (start / stop / health_check)
//! - [`ScanExecutor`]: 작업 큐가 스캔 파이프라인을 구동하는 경계
//!
//! 작업 큐는 [`ScanExecutor`] trait 객체만 알고 있으므로 스캐너 크레이트에
//! 의존하지 않습니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::HexalabError;
use crate::types::ScanResult;

/// `Send` boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 컴포넌트 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 성능 저하 또는 부분 장애
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 여부
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 상태 라벨
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded(_) => "degraded",
            Self::Unhealthy(_) => "unhealthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => f.write_str("healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 백그라운드 컴포넌트 생명주기
///
/// `start`는 한 번만 호출할 수 있으며, 이미 실행 중이면
/// [`PipelineError::AlreadyRunning`](crate::error::PipelineError::AlreadyRunning)을 반환합니다.
pub trait Pipeline: Send + Sync {
    /// 컴포넌트를 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), HexalabError>> + Send;

    /// 컴포넌트를 정지합니다. 진행 중인 작업은 가능한 한 마무리합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), HexalabError>> + Send;

    /// 현재 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// 스캔 실행기
///
/// 작업 하나의 입력 파일 목록을 받아 [`ScanResult`]를 만듭니다.
/// `job_id`는 산출물 디렉토리를 작업별로 분리하는 데 사용됩니다.
pub trait ScanExecutor: Send + Sync {
    /// 스캔을 실행합니다.
    fn execute<'a>(
        &'a self,
        job_id: &'a str,
        files: &'a [String],
    ) -> BoxFuture<'a, Result<ScanResult, HexalabError>>;

    /// 보존 기간이 지나 삭제된 작업의 산출물을 정리합니다.
    ///
    /// 산출물을 남기지 않는 실행기는 기본 구현을 그대로 사용합니다.
    fn discard<'a>(&'a self, _job_id: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}
