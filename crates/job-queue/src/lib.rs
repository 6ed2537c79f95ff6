//! # hexalab-job-queue
//!
//! 비동기 스캔 작업 큐, 작업 상태 저장소, 워커 풀.
//!
//! # 아키텍처
//!
//! ```text
//! JobQueue::enqueue ──> [bounded mpsc<JobId>] ──> WorkerPool (N workers)
//!        │                                              │
//!        └──────────────> JobStore <────────────────────┘
//!                      (queued/running/succeeded/failed)
//! ```
//!
//! - [`JobQueue`]: 제출과 상태/결과 조회를 담당하는 복제 가능한 핸들
//! - [`WorkerPool`]: [`Pipeline`](hexalab_core::Pipeline) 생명주기를 가진 워커 집합
//! - [`JobStore`]: 작업 레코드 저장소 ([`InMemoryJobStore`] 기본 구현)
//!
//! 스캔 실행은 [`ScanExecutor`](hexalab_core::ScanExecutor) trait 객체로 주입되므로
//! 이 크레이트는 스캐너 구현에 의존하지 않습니다.

pub mod config;
pub mod error;
pub mod job;
pub mod queue;
pub mod store;
pub mod worker;

pub use config::{QueueConfig, QueueConfigBuilder};
pub use error::JobQueueError;
pub use job::{JobId, JobPhase, ScanJob};
pub use queue::{JobQueue, JobQueueBuilder};
pub use store::{InMemoryJobStore, JobCounts, JobStore};
pub use worker::WorkerPool;
