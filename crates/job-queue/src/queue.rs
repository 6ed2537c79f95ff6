//! 작업 제출/조회 핸들
//!
//! [`JobQueue`]는 HTTP 핸들러 등 여러 태스크에서 복제해 사용하는 경량 핸들입니다.
//! 제출은 대기열 슬롯을 먼저 예약한 뒤 작업을 기록하므로 블로킹되지 않으며,
//! 거부된 제출은 작업 레코드를 남기지 않습니다.

use std::path::{Component, Path};
use std::sync::Arc;

use hexalab_core::metrics as m;
use hexalab_core::pipeline::ScanExecutor;
use hexalab_core::types::{ScanResult, ScanStatus};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::config::QueueConfig;
use crate::error::JobQueueError;
use crate::job::{JobId, JobPhase, ScanJob};
use crate::store::{InMemoryJobStore, JobCounts, JobStore};
use crate::worker::WorkerPool;

/// 작업 큐 핸들
#[derive(Clone)]
pub struct JobQueue {
    store: Arc<dyn JobStore>,
    tx: mpsc::Sender<JobId>,
    config: Arc<QueueConfig>,
}

impl JobQueue {
    /// 스캔 작업을 제출하고 새 작업 ID를 반환합니다.
    ///
    /// # Errors
    ///
    /// - [`JobQueueError::InvalidInput`]: 빈 목록, 빈 경로, 데이터 루트 밖의 경로
    /// - [`JobQueueError::QueueFull`]: 대기열이 가득 참
    /// - [`JobQueueError::Closed`]: 워커 풀이 해제됨
    pub async fn enqueue(&self, files: Vec<String>) -> Result<JobId, JobQueueError> {
        if let Err(e) = self.validate_files(&files).await {
            record_rejection("invalid_input");
            debug!(error = %e, "scan submission rejected");
            return Err(e);
        }

        let permit = match self.tx.try_reserve() {
            Ok(permit) => permit,
            Err(TrySendError::Full(())) => {
                record_rejection("full");
                warn!(capacity = self.config.capacity, "scan submission rejected: queue full");
                return Err(JobQueueError::QueueFull {
                    capacity: self.config.capacity,
                });
            }
            Err(TrySendError::Closed(())) => {
                record_rejection("closed");
                warn!("scan submission rejected: queue closed");
                return Err(JobQueueError::Closed);
            }
        };

        let job_id = JobId::new();
        let file_count = files.len();
        self.store.insert(ScanJob::new(job_id.clone(), files)).await;
        permit.send(job_id.clone());

        metrics::counter!(m::QUEUE_JOBS_ENQUEUED_TOTAL).increment(1);
        info!(job_id = %job_id, files = file_count, "scan job queued");
        Ok(job_id)
    }

    /// 작업 상태를 조회합니다.
    pub async fn get_status(&self, job_id: &str) -> Result<ScanStatus, JobQueueError> {
        self.lookup(job_id).await.map(|job| job.status())
    }

    /// 종료된 작업의 결과를 조회합니다.
    ///
    /// 진행 중이면 [`JobQueueError::JobNotReady`], 실패로 끝났으면
    /// [`JobQueueError::JobFailed`]를 반환합니다.
    pub async fn get_result(&self, job_id: &str) -> Result<ScanResult, JobQueueError> {
        let job = self.lookup(job_id).await?;
        match job.phase {
            JobPhase::Succeeded(result) => Ok(result),
            JobPhase::Failed(detail) => Err(JobQueueError::JobFailed {
                job_id: job_id.to_owned(),
                detail,
            }),
            phase @ (JobPhase::Queued | JobPhase::Running) => Err(JobQueueError::JobNotReady {
                job_id: job_id.to_owned(),
                state: phase.state(),
            }),
        }
    }

    /// 작업 스냅샷을 반환합니다.
    pub async fn get_job(&self, job_id: &str) -> Option<ScanJob> {
        self.store.get(job_id).await
    }

    /// 상태별 작업 수
    pub async fn stats(&self) -> JobCounts {
        self.store.counts().await
    }

    /// 대기열 여유 슬롯 수
    pub fn available_slots(&self) -> usize {
        self.tx.capacity()
    }

    /// 워커 풀 쪽 수신자가 해제되었는지 여부
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// 큐 설정
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    async fn lookup(&self, job_id: &str) -> Result<ScanJob, JobQueueError> {
        self.store
            .get(job_id)
            .await
            .ok_or_else(|| JobQueueError::UnknownJob {
                job_id: job_id.to_owned(),
            })
    }

    async fn validate_files(&self, files: &[String]) -> Result<(), JobQueueError> {
        if files.is_empty() {
            return Err(JobQueueError::InvalidInput(
                "no target files provided".to_owned(),
            ));
        }

        for file in files {
            if file.trim().is_empty() {
                return Err(JobQueueError::InvalidInput(
                    "target file path is empty".to_owned(),
                ));
            }
            if let Some(root) = &self.config.data_root {
                ensure_within_root(Path::new(root), file).await?;
            }
        }
        Ok(())
    }
}

/// 경로가 데이터 루트 안에 있는지 확인합니다.
///
/// 어휘적 검사 후, 경로가 존재하면 심볼릭 링크를 해석한 실제 경로로 다시 확인합니다.
async fn ensure_within_root(root: &Path, file: &str) -> Result<(), JobQueueError> {
    let path = Path::new(file);
    let outside = || {
        JobQueueError::InvalidInput(format!(
            "'{file}' is outside the data directory '{}'",
            root.display()
        ))
    };

    if !path.is_absolute() {
        return Err(JobQueueError::InvalidInput(format!(
            "'{file}' must be an absolute path"
        )));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(JobQueueError::InvalidInput(format!(
            "'{file}' must not contain '..'"
        )));
    }
    if !path.starts_with(root) {
        return Err(outside());
    }

    if let (Ok(real_root), Ok(real_path)) = (
        tokio::fs::canonicalize(root).await,
        tokio::fs::canonicalize(path).await,
    ) && !real_path.starts_with(&real_root)
    {
        return Err(outside());
    }

    Ok(())
}

fn record_rejection(reason: &'static str) {
    metrics::counter!(m::QUEUE_JOBS_REJECTED_TOTAL, m::LABEL_RESULT => reason).increment(1);
}

/// 작업 큐 빌더
///
/// 제출 핸들([`JobQueue`])과 워커 풀([`WorkerPool`])을 같은 채널과 저장소로 묶어 생성합니다.
///
/// # 예시
///
/// ```ignore
/// let (queue, mut pool) = JobQueueBuilder::new()
///     .config(queue_config)
///     .executor(Arc::new(scan_pipeline))
///     .build()?;
/// pool.start().await?;
/// let job_id = queue.enqueue(vec!["/data/app.jar".into()]).await?;
/// ```
#[derive(Default)]
pub struct JobQueueBuilder {
    config: QueueConfig,
    executor: Option<Arc<dyn ScanExecutor>>,
    store: Option<Arc<dyn JobStore>>,
}

impl JobQueueBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 큐 설정을 지정합니다.
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// 스캔 실행기를 지정합니다. 필수입니다.
    pub fn executor(mut self, executor: Arc<dyn ScanExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// 작업 저장소를 지정합니다. 생략하면 [`InMemoryJobStore`]를 사용합니다.
    pub fn store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 큐와 워커 풀을 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정이 유효하지 않거나 실행기가 지정되지 않으면 [`JobQueueError::Config`]를 반환합니다.
    pub fn build(self) -> Result<(JobQueue, WorkerPool), JobQueueError> {
        self.config.validate()?;

        let executor = self.executor.ok_or_else(|| JobQueueError::Config {
            field: "executor".to_owned(),
            reason: "a scan executor is required".to_owned(),
        })?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryJobStore::new()));
        let config = Arc::new(self.config);
        let (tx, rx) = mpsc::channel(config.capacity);

        let queue = JobQueue {
            store: Arc::clone(&store),
            tx,
            config: Arc::clone(&config),
        };
        let pool = WorkerPool::new(config, store, executor, rx);
        Ok((queue, pool))
    }
}
