//! 외부 도구 실행 어댑터
//!
//! [`ToolRunner`]는 외부 CLI 도구(SBOM 생성기, 취약점 스캐너)를 실행하고
//! 결합된 stdout/stderr를 출력 파일에 기록하는 경계입니다.
//!
//! - [`ProcessToolRunner`]: `tokio::process::Command` 기반 운영 구현
//! - 테스트에서는 trait을 직접 구현한 stub을 사용합니다.
//!
//! # 실패 분류
//!
//! - 실행 파일을 찾거나 실행할 수 없음 (상대 경로 포함): `ToolNotFound`
//! - 0이 아닌 종료 코드 / 시그널 종료: `ToolExecution`
//! - 출력 파일 생성 실패: `Io`
//! - 타임아웃 (설정 시): `ToolTimeout`
//!
//! 재시도는 하지 않습니다.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hexalab_core::metrics as m;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::SbomScannerError;

/// 외부 도구 실행 trait
///
/// 구현체는 `output_path`를 생성(또는 덮어쓰기)하고 도구의 stdout과 stderr를
/// 모두 기록해야 합니다. 도구가 0으로 종료된 경우에만 `Ok(())`를 반환합니다.
pub trait ToolRunner: Send + Sync + 'static {
    /// 도구를 실행합니다.
    ///
    /// # Arguments
    ///
    /// - `executable`: 절대 경로의 실행 파일
    /// - `args`: 인자 목록 (셸 해석 없음)
    /// - `output_path`: 결합 출력이 기록될 파일. 부모 디렉토리는 존재해야 합니다.
    fn run(
        &self,
        executable: &Path,
        args: &[String],
        output_path: &Path,
    ) -> impl Future<Output = Result<(), SbomScannerError>> + Send;
}

impl<T: ToolRunner> ToolRunner for Arc<T> {
    fn run(
        &self,
        executable: &Path,
        args: &[String],
        output_path: &Path,
    ) -> impl Future<Output = Result<(), SbomScannerError>> + Send {
        (**self).run(executable, args, output_path)
    }
}

/// 서브프로세스 기반 [`ToolRunner`]
#[derive(Debug, Clone, Default)]
pub struct ProcessToolRunner {
    timeout: Option<Duration>,
}

impl ProcessToolRunner {
    /// 타임아웃 없는 러너를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 실행 타임아웃을 설정합니다. `None`이면 무제한입니다.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 설정된 타임아웃
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl ToolRunner for ProcessToolRunner {
    async fn run(
        &self,
        executable: &Path,
        args: &[String],
        output_path: &Path,
    ) -> Result<(), SbomScannerError> {
        let tool = executable.display().to_string();
        let label = tool_label(executable);

        if !executable.is_absolute() {
            record(&label, "not_found", None);
            return Err(SbomScannerError::ToolNotFound {
                tool,
                reason: "executable path must be absolute".to_owned(),
            });
        }

        let stdout = tokio::fs::File::create(output_path)
            .await
            .map_err(|e| SbomScannerError::io(output_path, e))?
            .into_std()
            .await;
        let stderr = stdout
            .try_clone()
            .map_err(|e| SbomScannerError::io(output_path, e))?;

        debug!(tool = %tool, ?args, output = %output_path.display(), "launching external tool");

        let started = Instant::now();
        let mut child = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                record(&label, "not_found", None);
                SbomScannerError::ToolNotFound {
                    tool: tool.clone(),
                    reason: e.to_string(),
                }
            })?;

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!(tool = %tool, error = %e, "failed to kill timed out tool");
                    }
                    record(&label, "timeout", Some(started.elapsed()));
                    warn!(tool = %tool, timeout_secs = limit.as_secs(), "external tool timed out");
                    return Err(SbomScannerError::ToolTimeout {
                        tool,
                        timeout_secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait().await,
        };

        let status = waited.map_err(|e| SbomScannerError::io(executable, e))?;
        let elapsed = started.elapsed();

        if status.success() {
            record(&label, "success", Some(elapsed));
            info!(
                tool = %tool,
                duration_ms = elapsed.as_millis() as u64,
                output = %output_path.display(),
                "external tool finished"
            );
            Ok(())
        } else {
            record(&label, "failure", Some(elapsed));
            warn!(
                tool = %tool,
                exit_code = ?status.code(),
                output = %output_path.display(),
                "external tool failed"
            );
            Err(SbomScannerError::ToolExecution {
                tool,
                exit_code: status.code(),
                output_path: output_path.display().to_string(),
            })
        }
    }
}

/// 메트릭 레이블용 도구 이름 (파일명만 사용)
fn tool_label(executable: &Path) -> String {
    executable
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| executable.display().to_string())
}

fn record(label: &str, result: &'static str, elapsed: Option<Duration>) {
    metrics::counter!(
        m::TOOL_INVOCATIONS_TOTAL,
        m::LABEL_TOOL => label.to_owned(),
        m::LABEL_RESULT => result
    )
    .increment(1);
    if let Some(elapsed) = elapsed {
        metrics::histogram!(m::TOOL_DURATION_SECONDS, m::LABEL_TOOL => label.to_owned())
            .record(elapsed.as_secs_f64());
    }
}
