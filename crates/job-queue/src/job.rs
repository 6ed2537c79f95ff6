//! 스캔 작업 모델
//!
//! [`ScanJob`]은 작업 큐가 단독으로 소유하는 레코드입니다. 단계는 [`JobPhase`]로
//! 표현되며, 결과와 실패 사유는 각각 종료 단계에만 존재합니다.

use std::borrow::Borrow;
use std::fmt;
use std::time::{Duration, SystemTime};

use hexalab_core::types::{JobState, ScanResult, ScanStatus};

/// 작업 식별자 (UUID v4 문자열)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    /// 새 고유 ID를 생성합니다.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 문자열 표현
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// 작업 단계
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    /// 워커 대기 중
    Queued,
    /// 실행 중
    Running,
    /// 성공 종료
    Succeeded(ScanResult),
    /// 실패 종료
    Failed(String),
}

impl JobPhase {
    /// 상태 라벨
    pub fn state(&self) -> JobState {
        match self {
            Self::Queued => JobState::Queued,
            Self::Running => JobState::Running,
            Self::Succeeded(_) => JobState::Succeeded,
            Self::Failed(_) => JobState::Failed,
        }
    }
}

/// 스캔 작업
#[derive(Debug, Clone)]
pub struct ScanJob {
    /// 작업 ID
    pub id: JobId,
    /// 스캔 대상 파일 경로
    pub files: Vec<String>,
    /// 현재 단계
    pub phase: JobPhase,
    /// 제출 시각
    pub created_at: SystemTime,
    /// 실행 시작 시각
    pub started_at: Option<SystemTime>,
    /// 종료 시각
    pub finished_at: Option<SystemTime>,
}

impl ScanJob {
    /// `queued` 상태의 새 작업을 생성합니다.
    pub fn new(id: JobId, files: Vec<String>) -> Self {
        Self {
            id,
            files,
            phase: JobPhase::Queued,
            created_at: SystemTime::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// 상태 라벨
    pub fn state(&self) -> JobState {
        self.phase.state()
    }

    /// 상태 조회 결과를 계산합니다.
    pub fn status(&self) -> ScanStatus {
        let detail = match &self.phase {
            JobPhase::Failed(detail) => Some(detail.clone()),
            JobPhase::Succeeded(result) => Some(result.summary.clone()),
            JobPhase::Queued | JobPhase::Running => None,
        };
        ScanStatus {
            job_id: self.id.to_string(),
            status: self.state(),
            detail,
        }
    }

    /// 실행 시간 (시작 ~ 종료)
    pub fn run_duration(&self) -> Option<Duration> {
        let started = self.started_at?;
        let finished = self.finished_at?;
        finished.duration_since(started).ok()
    }

    /// 종료 후 `retention`이 지났는지 여부. 진행 중인 작업은 만료되지 않습니다.
    pub fn is_expired(&self, retention: Duration, now: SystemTime) -> bool {
        match self.finished_at {
            Some(finished) if self.state().is_terminal() => now
                .duration_since(finished)
                .is_ok_and(|elapsed| elapsed >= retention),
            _ => false,
        }
    }
}
