//! 작업 큐 에러 타입
//!
//! [`JobQueueError`]는 작업 제출/조회와 워커 풀 구성에서 발생하는 에러를 표현합니다.
//! `From<JobQueueError> for HexalabError` 변환으로 상위 레이어에 전파됩니다.

use hexalab_core::error::{ConfigError, HexalabError, QueueError};
use hexalab_core::types::JobState;

/// 작업 큐 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    /// 제출 입력 오류 (빈 목록, 데이터 루트 밖의 경로 등). 작업은 생성되지 않습니다.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 등록되지 않은 작업 ID
    #[error("unknown job: {job_id}")]
    UnknownJob {
        /// 조회한 작업 ID
        job_id: String,
    },

    /// 작업이 아직 종료되지 않음
    #[error("job {job_id} is not ready (status: {state})")]
    JobNotReady {
        /// 작업 ID
        job_id: String,
        /// 현재 상태 (queued 또는 running)
        state: JobState,
    },

    /// 작업이 실패로 종료됨
    #[error("job {job_id} failed: {detail}")]
    JobFailed {
        /// 작업 ID
        job_id: String,
        /// 실패 사유
        detail: String,
    },

    /// 대기열이 가득 참
    #[error("queue is full (capacity: {capacity})")]
    QueueFull {
        /// 대기열 용량
        capacity: usize,
    },

    /// 워커 측이 종료되어 더 이상 작업을 받을 수 없음
    #[error("queue is closed")]
    Closed,

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<JobQueueError> for HexalabError {
    fn from(err: JobQueueError) -> Self {
        match err {
            JobQueueError::Config { field, reason } => {
                HexalabError::Config(ConfigError::InvalidValue { field, reason })
            }
            JobQueueError::InvalidInput(_) => {
                HexalabError::Queue(QueueError::Rejected(err.to_string()))
            }
            JobQueueError::UnknownJob { .. }
            | JobQueueError::JobNotReady { .. }
            | JobQueueError::JobFailed { .. } => {
                HexalabError::Queue(QueueError::Lookup(err.to_string()))
            }
            JobQueueError::QueueFull { .. } | JobQueueError::Closed => {
                HexalabError::Queue(QueueError::Unavailable(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_display_includes_state() {
        let err = JobQueueError::JobNotReady {
            job_id: "abc".to_owned(),
            state: JobState::Running,
        };
        assert_eq!(err.to_string(), "job abc is not ready (status: running)");
    }

    #[test]
    fn conversion_preserves_category() {
        let err: HexalabError = JobQueueError::QueueFull { capacity: 8 }.into();
        assert!(matches!(err, HexalabError::Queue(QueueError::Unavailable(_))));

        let err: HexalabError = JobQueueError::UnknownJob {
            job_id: "x".to_owned(),
        }
        .into();
        assert!(matches!(err, HexalabError::Queue(QueueError::Lookup(_))));

        let err: HexalabError = JobQueueError::Config {
            field: "workers".to_owned(),
            reason: "must be > 0".to_owned(),
        }
        .into();
        assert!(matches!(err, HexalabError::Config(_)));
    }
}
