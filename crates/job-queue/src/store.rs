//! 작업 상태 저장소
//!
//! [`JobStore`]는 작업 레코드의 생성, 조회, 단계 전이를 담당합니다.
//! 각 전이는 하나의 임계 구역에서 수행되므로 조회자는 중간 상태를 볼 수 없습니다.
//!
//! 전이 규칙:
//!
//! ```text
//! insert --> queued --claim--> running --finish--> succeeded | failed
//! ```
//!
//! 종료 단계의 작업은 다시 전이하지 않습니다.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use hexalab_core::pipeline::BoxFuture;
use hexalab_core::types::ScanResult;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::job::{JobId, JobPhase, ScanJob};

/// 상태별 작업 수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    /// 대기 중
    pub queued: usize,
    /// 실행 중
    pub running: usize,
    /// 성공 종료
    pub succeeded: usize,
    /// 실패 종료
    pub failed: usize,
}

impl JobCounts {
    /// 전체 작업 수
    pub fn total(&self) -> usize {
        self.queued + self.running + self.succeeded + self.failed
    }
}

/// 작업 저장소 trait
///
/// 작업 큐와 워커 풀이 `Arc<dyn JobStore>`로 공유합니다.
pub trait JobStore: Send + Sync {
    /// 새 작업을 기록합니다.
    fn insert(&self, job: ScanJob) -> BoxFuture<'_, ()>;

    /// 작업 스냅샷을 반환합니다.
    fn get<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Option<ScanJob>>;

    /// `queued` 작업을 `running`으로 전이하고 입력 파일 목록을 반환합니다.
    ///
    /// 작업이 없거나 `queued`가 아니면 `None`을 반환합니다.
    fn claim<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Option<Vec<String>>>;

    /// `running` 작업을 종료 단계로 전이합니다.
    ///
    /// 전이에 성공하면 종료된 작업 스냅샷을, 작업이 `running`이 아니면 `None`을 반환합니다.
    fn finish<'a>(
        &'a self,
        job_id: &'a str,
        outcome: Result<ScanResult, String>,
    ) -> BoxFuture<'a, Option<ScanJob>>;

    /// 종료 후 `retention`이 지난 작업을 삭제하고 삭제된 ID를 반환합니다.
    fn purge_expired(&self, retention: Duration) -> BoxFuture<'_, Vec<JobId>>;

    /// 상태별 작업 수
    fn counts(&self) -> BoxFuture<'_, JobCounts>;
}

/// 메모리 기반 [`JobStore`]
///
/// 프로세스가 종료되면 모든 작업이 사라집니다.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, ScanJob>>,
}

impl InMemoryJobStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: ScanJob) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.jobs.write().await.insert(job.id.clone(), job);
        })
    }

    fn get<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Option<ScanJob>> {
        Box::pin(async move { self.jobs.read().await.get(job_id).cloned() })
    }

    fn claim<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Option<Vec<String>>> {
        Box::pin(async move {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(job_id)?;
            if job.phase != JobPhase::Queued {
                debug!(job_id, state = %job.state(), "claim skipped: job not queued");
                return None;
            }
            job.phase = JobPhase::Running;
            job.started_at = Some(SystemTime::now());
            Some(job.files.clone())
        })
    }

    fn finish<'a>(
        &'a self,
        job_id: &'a str,
        outcome: Result<ScanResult, String>,
    ) -> BoxFuture<'a, Option<ScanJob>> {
        Box::pin(async move {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(job_id)?;
            if job.phase != JobPhase::Running {
                debug!(job_id, state = %job.state(), "finish skipped: job not running");
                return None;
            }
            job.phase = match outcome {
                Ok(result) => JobPhase::Succeeded(result),
                Err(detail) => JobPhase::Failed(detail),
            };
            job.finished_at = Some(SystemTime::now());
            Some(job.clone())
        })
    }

    fn purge_expired(&self, retention: Duration) -> BoxFuture<'_, Vec<JobId>> {
        Box::pin(async move {
            let now = SystemTime::now();
            let mut jobs = self.jobs.write().await;
            let expired: Vec<JobId> = jobs
                .values()
                .filter(|job| job.is_expired(retention, now))
                .map(|job| job.id.clone())
                .collect();
            for id in &expired {
                jobs.remove(id);
            }
            expired
        })
    }

    fn counts(&self) -> BoxFuture<'_, JobCounts> {
        Box::pin(async move {
            let jobs = self.jobs.read().await;
            jobs.values().fold(JobCounts::default(), |mut acc, job| {
                match job.phase {
                    JobPhase::Queued => acc.queued += 1,
                    JobPhase::Running => acc.running += 1,
                    JobPhase::Succeeded(_) => acc.succeeded += 1,
                    JobPhase::Failed(_) => acc.failed += 1,
                }
                acc
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexalab_core::types::JobState;

    async fn store_with_job() -> (InMemoryJobStore, JobId) {
        let store = InMemoryJobStore::new();
        let id = JobId::new();
        store
            .insert(ScanJob::new(id.clone(), vec!["/data/a.jar".to_owned()]))
            .await;
        (store, id)
    }

    #[tokio::test]
    async fn claim_transitions_queued_to_running_once() {
        let (store, id) = store_with_job().await;

        let files = store.claim(id.as_str()).await.unwrap();
        assert_eq!(files, vec!["/data/a.jar"]);

        let job = store.get(id.as_str()).await.unwrap();
        assert_eq!(job.state(), JobState::Running);
        assert!(job.started_at.is_some());

        // 두 번째 claim은 실패
        assert!(store.claim(id.as_str()).await.is_none());
    }

    #[tokio::test]
    async fn finish_requires_running() {
        let (store, id) = store_with_job().await;

        assert!(
            store
                .finish(id.as_str(), Err("too early".to_owned()))
                .await
                .is_none()
        );

        store.claim(id.as_str()).await.unwrap();
        let done = store
            .finish(id.as_str(), Ok(ScanResult::empty()))
            .await
            .unwrap();
        assert_eq!(done.state(), JobState::Succeeded);
        assert!(done.run_duration().is_some());

        // 종료 단계는 최종
        assert!(
            store
                .finish(id.as_str(), Err("late".to_owned()))
                .await
                .is_none()
        );
        let job = store.get(id.as_str()).await.unwrap();
        assert_eq!(job.state(), JobState::Succeeded);
    }

    #[tokio::test]
    async fn unknown_ids_are_absent() {
        let store = InMemoryJobStore::new();
        assert!(store.get("missing").await.is_none());
        assert!(store.claim("missing").await.is_none());
        assert!(store.finish("missing", Err("x".to_owned())).await.is_none());
    }

    #[tokio::test]
    async fn purge_removes_only_expired_terminal_jobs() {
        let store = InMemoryJobStore::new();
        let done = JobId::new();
        let running = JobId::new();
        let queued = JobId::new();
        for id in [&done, &running, &queued] {
            store
                .insert(ScanJob::new(id.clone(), vec!["/data/a".to_owned()]))
                .await;
        }
        store.claim(done.as_str()).await.unwrap();
        store
            .finish(done.as_str(), Err("boom".to_owned()))
            .await
            .unwrap();
        store.claim(running.as_str()).await.unwrap();

        assert_eq!(store.purge_expired(Duration::ZERO).await, vec![done.clone()]);
        assert!(store.get(done.as_str()).await.is_none());
        assert!(store.get(running.as_str()).await.is_some());
        assert!(store.get(queued.as_str()).await.is_some());
    }

    #[tokio::test]
    async fn counts_by_state() {
        let (store, id) = store_with_job().await;
        store
            .insert(ScanJob::new(JobId::new(), vec!["/data/b".to_owned()]))
            .await;
        store.claim(id.as_str()).await.unwrap();

        let counts = store.counts().await;
        assert_eq!(counts.queued, 1);
        assert_eq!(counts.running, 1);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn counts_serialize_as_flat_object() {
        let counts = JobCounts {
            queued: 3,
            running: 1,
            succeeded: 7,
            failed: 2,
        };
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"queued": 3, "running": 1, "succeeded": 7, "failed": 2})
        );
    }
}
