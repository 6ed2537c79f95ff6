//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `hexalab_`
//! - 모듈명: `tool_`, `scan_`, `queue_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(hexalab_core::metrics::QUEUE_JOBS_ENQUEUED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 도구 이름 레이블 키 (syft, grype, ...)
pub const LABEL_TOOL: &str = "tool";

/// 결과 레이블 키 (success, failure, timeout)
pub const LABEL_RESULT: &str = "result";

/// 작업 종료 상태 레이블 키 (succeeded, failed)
pub const LABEL_OUTCOME: &str = "outcome";

/// 심각도 레이블 키 (critical, high)
pub const LABEL_SEVERITY: &str = "severity";

// ─── External Tool 메트릭 ──────────────────────────────────────────

/// 외부 도구 실행 수 (counter, label: tool, result)
pub const TOOL_INVOCATIONS_TOTAL: &str = "hexalab_tool_invocations_total";

/// 외부 도구 실행 시간 (histogram, 초, label: tool)
pub const TOOL_DURATION_SECONDS: &str = "hexalab_tool_duration_seconds";

// ─── Scan Pipeline 메트릭 ──────────────────────────────────────────

/// 완료된 전체 스캔 수 (counter)
pub const SCAN_COMPLETED_TOTAL: &str = "hexalab_scan_completed_total";

/// 발견된 취약점 수 (counter, label: severity)
pub const SCAN_VULNERABILITIES_FOUND_TOTAL: &str = "hexalab_scan_vulnerabilities_found_total";

// ─── Job Queue 메트릭 ──────────────────────────────────────────────

/// 제출된 작업 수 (counter)
pub const QUEUE_JOBS_ENQUEUED_TOTAL: &str = "hexalab_queue_jobs_enqueued_total";

/// 제출 거부 수 (counter, label: result)
pub const QUEUE_JOBS_REJECTED_TOTAL: &str = "hexalab_queue_jobs_rejected_total";

/// 종료된 작업 수 (counter, label: outcome)
pub const QUEUE_JOBS_COMPLETED_TOTAL: &str = "hexalab_queue_jobs_completed_total";

/// 실행 중인 작업 수 (gauge)
pub const QUEUE_JOBS_RUNNING: &str = "hexalab_queue_jobs_running";

/// 작업 실행 시간 (histogram, 초)
pub const QUEUE_JOB_DURATION_SECONDS: &str = "hexalab_queue_job_duration_seconds";

/// 보존 기간 만료로 삭제된 작업 수 (counter)
pub const QUEUE_JOBS_EXPIRED_TOTAL: &str = "hexalab_queue_jobs_expired_total";

// ─── Daemon 메트릭 ─────────────────────────────────────────────────

/// 데몬 빌드 정보 (gauge, 항상 1)
pub const DAEMON_BUILD_INFO: &str = "hexalab_daemon_build_info";

// ─── 히스토그램 버킷 ───────────────────────────────────────────────

/// 스캔 작업 시간 버킷 (초)
///
/// 1s ~ 30min 범위 (외부 도구는 취약점 DB 갱신을 포함할 수 있음)
pub const JOB_DURATION_BUCKETS: [f64; 10] = [
    1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 1800.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `hexalab-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        TOOL_INVOCATIONS_TOTAL,
        "Total number of external tool invocations by tool and result"
    );
    describe_histogram!(
        TOOL_DURATION_SECONDS,
        "External tool wall-clock duration in seconds"
    );

    describe_counter!(
        SCAN_COMPLETED_TOTAL,
        "Total number of full scans completed successfully"
    );
    describe_counter!(
        SCAN_VULNERABILITIES_FOUND_TOTAL,
        "Total number of vulnerability records found, by aggregated severity"
    );

    describe_counter!(
        QUEUE_JOBS_ENQUEUED_TOTAL,
        "Total number of scan jobs accepted into the queue"
    );
    describe_counter!(
        QUEUE_JOBS_REJECTED_TOTAL,
        "Total number of scan submissions rejected"
    );
    describe_counter!(
        QUEUE_JOBS_COMPLETED_TOTAL,
        "Total number of scan jobs that reached a terminal state"
    );
    describe_gauge!(
        QUEUE_JOBS_RUNNING,
        "Number of scan jobs currently being executed"
    );
    describe_histogram!(
        QUEUE_JOB_DURATION_SECONDS,
        "Time from job claim to terminal state in seconds"
    );
    describe_counter!(
        QUEUE_JOBS_EXPIRED_TOTAL,
        "Total number of terminal jobs removed by the retention sweeper"
    );

    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        TOOL_INVOCATIONS_TOTAL,
        TOOL_DURATION_SECONDS,
        SCAN_COMPLETED_TOTAL,
        SCAN_VULNERABILITIES_FOUND_TOTAL,
        QUEUE_JOBS_ENQUEUED_TOTAL,
        QUEUE_JOBS_REJECTED_TOTAL,
        QUEUE_JOBS_COMPLETED_TOTAL,
        QUEUE_JOBS_RUNNING,
        QUEUE_JOB_DURATION_SECONDS,
        QUEUE_JOBS_EXPIRED_TOTAL,
        DAEMON_BUILD_INFO,
    ];

    #[test]
    fn all_metrics_start_with_hexalab_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(name.starts_with("hexalab_"), "bad prefix: {name}");
        }
    }

    #[test]
    fn metric_names_are_unique() {
        let mut names = ALL_METRIC_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_METRIC_NAMES.len());
    }

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더가 설치되지 않은 상태에서도 no-op으로 동작해야 함
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for key in [LABEL_TOOL, LABEL_RESULT, LABEL_OUTCOME, LABEL_SEVERITY] {
            assert_eq!(key, key.to_lowercase());
        }
    }

    #[test]
    fn job_duration_buckets_are_sorted() {
        assert!(JOB_DURATION_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }
}
