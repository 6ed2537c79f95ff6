//! 작업 큐 설정
//!
//! [`QueueConfig`]는 core의 [`QueueSection`](hexalab_core::config::QueueSection)과
//! 데이터 루트(`general.data_dir`)에서 파생됩니다.
//!
//! ```
//! use hexalab_job_queue::QueueConfigBuilder;
//!
//! let config = QueueConfigBuilder::new()
//!     .workers(4)
//!     .capacity(64)
//!     .data_root(Some("/data".to_owned()))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.workers, 4);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JobQueueError;

const MAX_WORKERS: usize = 256;
const MAX_CAPACITY: usize = 1_000_000;
const MAX_SHUTDOWN_TIMEOUT_SECS: u64 = 3_600;
/// 보존 기간 정리 주기 상한
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// 작업 큐 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// 워커 수
    pub workers: usize,
    /// 대기열 최대 길이
    pub capacity: usize,
    /// 종료 상태 작업 보존 기간 (초). 0이면 영구 보존
    pub retention_secs: u64,
    /// 정지 시 실행 중 작업 대기 시간 (초)
    pub shutdown_timeout_secs: u64,
    /// 제출 경로가 속해야 하는 데이터 루트. `None`이면 제한 없음
    pub data_root: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        let core = hexalab_core::config::HexalabConfig::default();
        Self::from_core(&core.queue, &core.general)
    }
}

impl QueueConfig {
    /// core 설정에서 작업 큐 설정을 생성합니다.
    pub fn from_core(
        queue: &hexalab_core::config::QueueSection,
        general: &hexalab_core::config::GeneralConfig,
    ) -> Self {
        Self {
            workers: queue.workers,
            capacity: queue.capacity,
            retention_secs: queue.retention_secs,
            shutdown_timeout_secs: queue.shutdown_timeout_secs,
            data_root: queue
                .restrict_to_data_dir
                .then(|| general.data_dir.clone()),
        }
    }

    /// 보존 기간. 0이면 `None`
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_secs > 0).then(|| Duration::from_secs(self.retention_secs))
    }

    /// 보존 기간 정리 주기 (보존 기간과 60초 중 작은 값)
    pub fn sweep_interval(&self) -> Option<Duration> {
        self.retention()
            .map(|retention| retention.min(MAX_SWEEP_INTERVAL))
    }

    /// 정지 대기 시간
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// - `workers`: 1-256
    /// - `capacity`: 1-1000000
    /// - `shutdown_timeout_secs`: 0-3600
    /// - `data_root`: 설정 시 절대 경로
    pub fn validate(&self) -> Result<(), JobQueueError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(config_err("workers", format!("must be 1-{MAX_WORKERS}")));
        }

        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(config_err("capacity", format!("must be 1-{MAX_CAPACITY}")));
        }

        if self.shutdown_timeout_secs > MAX_SHUTDOWN_TIMEOUT_SECS {
            return Err(config_err(
                "shutdown_timeout_secs",
                format!("must be 0-{MAX_SHUTDOWN_TIMEOUT_SECS}"),
            ));
        }

        if let Some(root) = &self.data_root
            && !Path::new(root).is_absolute()
        {
            return Err(config_err(
                "data_root",
                format!("'{root}' must be an absolute path"),
            ));
        }

        Ok(())
    }
}

fn config_err(field: &str, reason: impl Into<String>) -> JobQueueError {
    JobQueueError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// [`QueueConfig`] 빌더
#[derive(Default)]
pub struct QueueConfigBuilder {
    config: QueueConfig,
}

impl QueueConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 워커 수를 설정합니다.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// 대기열 용량을 설정합니다.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// 보존 기간(초)을 설정합니다.
    pub fn retention_secs(mut self, secs: u64) -> Self {
        self.config.retention_secs = secs;
        self
    }

    /// 정지 대기 시간(초)을 설정합니다.
    pub fn shutdown_timeout_secs(mut self, secs: u64) -> Self {
        self.config.shutdown_timeout_secs = secs;
        self
    }

    /// 데이터 루트를 설정합니다.
    pub fn data_root(mut self, root: Option<String>) -> Self {
        self.config.data_root = root;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    pub fn build(self) -> Result<QueueConfig, JobQueueError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
