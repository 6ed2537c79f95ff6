//! 워커 풀
//!
//! [`WorkerPool`]은 `workers`개의 태스크를 띄워 공유 대기열에서 작업 ID를 하나씩 꺼내 실행합니다.
//! 각 작업의 스캔은 별도 태스크에서 실행되어, 실행기가 panic해도 워커는 계속 동작하고
//! 해당 작업만 `failed`로 기록됩니다.
//!
//! # 정지 절차
//!
//! 1. 취소 토큰으로 새 작업 수신을 중단
//! 2. 실행 중인 작업을 `shutdown_timeout_secs` 동안 대기
//! 3. 시간 초과 시 워커 태스크 중단 (중단된 작업은 `running`으로 남음)

use std::any::Any;
use std::sync::Arc;

use hexalab_core::error::{HexalabError, PipelineError};
use hexalab_core::metrics as m;
use hexalab_core::pipeline::{HealthStatus, Pipeline, ScanExecutor};
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::QueueConfig;
use crate::job::JobId;
use crate::store::JobStore;

/// 워커 풀 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Initialized,
    Running,
    Stopped,
}

/// 워커 태스크가 공유하는 의존성
#[derive(Clone)]
struct WorkerContext {
    store: Arc<dyn JobStore>,
    executor: Arc<dyn ScanExecutor>,
    rx: Arc<Mutex<mpsc::Receiver<JobId>>>,
}

/// 스캔 워커 풀
///
/// [`JobQueueBuilder::build`](crate::JobQueueBuilder::build)로 생성하며,
/// [`Pipeline`] trait으로 시작/정지합니다. 정지 후 다시 시작할 수 있습니다.
pub struct WorkerPool {
    config: Arc<QueueConfig>,
    context: WorkerContext,
    state: PoolState,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    sweeper: Option<JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn new(
        config: Arc<QueueConfig>,
        store: Arc<dyn JobStore>,
        executor: Arc<dyn ScanExecutor>,
        rx: mpsc::Receiver<JobId>,
    ) -> Self {
        Self {
            config,
            context: WorkerContext {
                store,
                executor,
                rx: Arc::new(Mutex::new(rx)),
            },
            state: PoolState::Initialized,
            cancel: CancellationToken::new(),
            workers: Vec::new(),
            sweeper: None,
        }
    }

    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PoolState::Initialized => "initialized",
            PoolState::Running => "running",
            PoolState::Stopped => "stopped",
        }
    }

    /// 실행 중인 워커 태스크 수
    pub fn active_workers(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_finished()).count()
    }

    fn spawn_sweeper(&mut self) {
        let (Some(retention), Some(interval)) =
            (self.config.retention(), self.config.sweep_interval())
        else {
            return;
        };

        let store = Arc::clone(&self.context.store);
        let executor = Arc::clone(&self.context.executor);
        let cancel = self.cancel.clone();
        self.sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let expired = store.purge_expired(retention).await;
                        if !expired.is_empty() {
                            for job_id in &expired {
                                executor.discard(job_id.as_str()).await;
                            }
                            metrics::counter!(m::QUEUE_JOBS_EXPIRED_TOTAL)
                                .increment(expired.len() as u64);
                            debug!(removed = expired.len(), "expired jobs purged");
                        }
                    }
                }
            }
        }));
    }
}

impl Pipeline for WorkerPool {
    async fn start(&mut self) -> Result<(), HexalabError> {
        if self.state == PoolState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!(
            workers = self.config.workers,
            capacity = self.config.capacity,
            "starting worker pool"
        );

        self.cancel = CancellationToken::new();
        for worker in 0..self.config.workers {
            let context = self.context.clone();
            let cancel = self.cancel.clone();
            self.workers
                .push(tokio::spawn(worker_loop(worker, context, cancel)));
        }
        self.spawn_sweeper();

        self.state = PoolState::Running;
        info!("worker pool started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), HexalabError> {
        if self.state != PoolState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping worker pool");
        self.cancel.cancel();

        let workers: Vec<_> = self.workers.drain(..).collect();
        let aborts: Vec<_> = workers.iter().map(JoinHandle::abort_handle).collect();
        let timeout = self.config.shutdown_timeout();

        let drained = tokio::time::timeout(timeout, async move {
            for worker in workers {
                if let Err(e) = worker.await
                    && e.is_panic()
                {
                    error!(error = %e, "worker task panicked");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                timeout_secs = timeout.as_secs(),
                "in-flight jobs did not finish before shutdown timeout, aborting workers"
            );
            for abort in aborts {
                abort.abort();
            }
        }

        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
            let _ = sweeper.await;
        }

        self.state = PoolState::Stopped;
        info!("worker pool stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PoolState::Running => {
                let total = self.workers.len();
                let stopped = total - self.active_workers();
                if stopped == 0 {
                    HealthStatus::Healthy
                } else if stopped == total {
                    HealthStatus::Unhealthy("all workers stopped".to_owned())
                } else {
                    HealthStatus::Degraded(format!("{stopped} of {total} workers stopped"))
                }
            }
            PoolState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PoolState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

async fn worker_loop(worker: usize, context: WorkerContext, cancel: CancellationToken) {
    debug!(worker, "worker started");
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            job_id = recv_next(&context.rx) => job_id,
        };
        let Some(job_id) = next else {
            break;
        };
        process_job(worker, &context, job_id).await;
    }
    debug!(worker, "worker stopped");
}

async fn recv_next(rx: &Mutex<mpsc::Receiver<JobId>>) -> Option<JobId> {
    rx.lock().await.recv().await
}

/// 작업 하나를 `running`으로 전이하고 실행한 뒤 결과를 기록합니다.
async fn process_job(worker: usize, context: &WorkerContext, job_id: JobId) {
    let Some(files) = context.store.claim(job_id.as_str()).await else {
        warn!(worker, job_id = %job_id, "dequeued job is not claimable, skipping");
        return;
    };

    info!(worker, job_id = %job_id, files = files.len(), "scan job started");
    metrics::gauge!(m::QUEUE_JOBS_RUNNING).increment(1.0);

    // 실행 태스크는 JoinSet이 소유하므로 워커가 중단되면 함께 중단된다
    let mut execution = JoinSet::new();
    let executor = Arc::clone(&context.executor);
    let task_job_id = job_id.clone();
    execution.spawn(async move { executor.execute(task_job_id.as_str(), &files).await });

    let outcome = match execution.join_next().await {
        Some(Ok(Ok(result))) => Ok(result),
        Some(Ok(Err(e))) => Err(e.to_string()),
        Some(Err(e)) if e.is_panic() => {
            Err(format!("scan panicked: {}", panic_message(e.into_panic().as_ref())))
        }
        Some(Err(e)) => Err(format!("scan task cancelled: {e}")),
        None => Err("scan task was not scheduled".to_owned()),
    };

    metrics::gauge!(m::QUEUE_JOBS_RUNNING).decrement(1.0);

    match &outcome {
        Ok(result) => info!(
            worker,
            job_id = %job_id,
            total_vulns = result.total_vulns,
            critical = result.critical,
            high = result.high,
            "scan job succeeded"
        ),
        Err(detail) => warn!(worker, job_id = %job_id, detail = %detail, "scan job failed"),
    }

    let Some(job) = context.store.finish(job_id.as_str(), outcome).await else {
        warn!(worker, job_id = %job_id, "job left running state before completion");
        return;
    };

    metrics::counter!(m::QUEUE_JOBS_COMPLETED_TOTAL, m::LABEL_OUTCOME => job.state().as_str())
        .increment(1);
    if let Some(duration) = job.run_duration() {
        metrics::histogram!(m::QUEUE_JOB_DURATION_SECONDS).record(duration.as_secs_f64());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
