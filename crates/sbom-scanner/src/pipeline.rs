//! 스캔 파이프라인: SBOM 생성 → 취약점 스캔 → 결과 집계
//!
//! [`ScanPipeline`]은 두 외부 도구를 순서대로 실행하고, 취약점 리포트를
//! [`ScanResult`]로 정규화합니다.
//!
//! # 산출물 배치
//!
//! 한 번의 실행에 필요한 파일은 [`ArtifactLayout`] 디렉토리 안에 생성됩니다.
//!
//! ```text
//! <dir>/
//!   sbom.cdx.json     SBOM 생성 도구 출력
//!   cve_report.json   취약점 스캐너 출력
//! ```
//!
//! 작업 큐에서 실행될 때는 작업마다 `<artifact_dir>/<job_id>/`를 사용하므로
//! 동시에 실행되는 작업끼리 산출물이 섞이지 않습니다. 보존 기간이 지난 작업의
//! 디렉토리는 [`ScanExecutor::discard`]로 삭제됩니다.

use std::path::{Path, PathBuf};

use hexalab_core::error::HexalabError;
use hexalab_core::metrics as m;
use hexalab_core::pipeline::{BoxFuture, ScanExecutor};
use hexalab_core::types::{ScanArtifacts, ScanResult};
use tracing::{debug, info, warn};

use crate::config::SbomScannerConfig;
use crate::error::SbomScannerError;
use crate::report;
use crate::tool::{ProcessToolRunner, ToolRunner};

/// SBOM 산출물 파일명
pub const SBOM_FILE_NAME: &str = "sbom.cdx.json";
/// 취약점 리포트 파일명
pub const REPORT_FILE_NAME: &str = "cve_report.json";

/// 한 번의 스캔 실행에 사용되는 산출물 디렉토리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    dir: PathBuf,
}

impl ArtifactLayout {
    /// 지정한 디렉토리를 그대로 사용합니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<root>/<job_id>/` 레이아웃을 만듭니다.
    ///
    /// `job_id`는 하나의 경로 구성요소여야 하며 영숫자, `-`, `_`만 허용됩니다.
    pub fn for_job(root: impl AsRef<Path>, job_id: &str) -> Result<Self, SbomScannerError> {
        let valid = !job_id.is_empty()
            && job_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SbomScannerError::InvalidInput(format!(
                "job id '{job_id}' is not a valid directory name"
            )));
        }
        Ok(Self::new(root.as_ref().join(job_id)))
    }

    /// 산출물 디렉토리
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// SBOM 파일 경로
    pub fn sbom_path(&self) -> PathBuf {
        self.dir.join(SBOM_FILE_NAME)
    }

    /// 취약점 리포트 파일 경로
    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE_NAME)
    }
}

/// 스캔 파이프라인
///
/// 도구 실행은 [`ToolRunner`]에 위임하므로 테스트에서는 stub 러너를 주입할 수 있습니다.
pub struct ScanPipeline<R: ToolRunner = ProcessToolRunner> {
    config: SbomScannerConfig,
    runner: R,
}

impl ScanPipeline<ProcessToolRunner> {
    /// 설정을 검증하고 서브프로세스 러너로 파이프라인을 생성합니다.
    pub fn from_config(config: SbomScannerConfig) -> Result<Self, SbomScannerError> {
        let runner = ProcessToolRunner::new().with_timeout(config.tool_timeout());
        Self::with_runner(config, runner)
    }
}

impl<R: ToolRunner> ScanPipeline<R> {
    /// 설정을 검증하고 지정한 러너로 파이프라인을 생성합니다.
    pub fn with_runner(config: SbomScannerConfig, runner: R) -> Result<Self, SbomScannerError> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    /// 현재 설정
    pub fn config(&self) -> &SbomScannerConfig {
        &self.config
    }

    /// 설정된 산출물 디렉토리를 그대로 사용하는 레이아웃
    pub fn default_layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(&self.config.artifact_dir)
    }

    /// SBOM을 생성하고 SBOM 파일 경로를 반환합니다.
    ///
    /// `<sbom_tool> <files...> -o <sbom_output_format>`
    ///
    /// # Errors
    ///
    /// - `files`가 비어있으면 `InvalidInput` (도구를 실행하지 않음)
    /// - 도구 실행 에러는 그대로 전파
    pub async fn generate_sbom(
        &self,
        layout: &ArtifactLayout,
        files: &[String],
    ) -> Result<PathBuf, SbomScannerError> {
        ensure_files(files)?;

        let sbom_path = layout.sbom_path();
        let mut args = files.to_vec();
        args.push("-o".to_owned());
        args.push(self.config.sbom_output_format.clone());

        self.runner
            .run(Path::new(&self.config.sbom_tool_path), &args, &sbom_path)
            .await?;

        debug!(sbom = %sbom_path.display(), files = files.len(), "sbom generated");
        Ok(sbom_path)
    }

    /// SBOM을 취약점 스캐너에 넘기고 리포트 파일 경로를 반환합니다.
    ///
    /// `<vuln_tool> <sbom_uri_scheme>:<sbom_path> -o <report_output_format>`
    pub async fn scan_for_vulnerabilities(
        &self,
        layout: &ArtifactLayout,
        sbom_path: &Path,
    ) -> Result<PathBuf, SbomScannerError> {
        let report_path = layout.report_path();
        let args = vec![
            format!("{}:{}", self.config.sbom_uri_scheme, sbom_path.display()),
            "-o".to_owned(),
            self.config.report_output_format.clone(),
        ];

        self.runner
            .run(Path::new(&self.config.vuln_tool_path), &args, &report_path)
            .await?;

        debug!(report = %report_path.display(), "vulnerability report generated");
        Ok(report_path)
    }

    /// 전체 스캔을 실행합니다.
    ///
    /// 1. 입력 검증 (비어있으면 디렉토리도 만들지 않음)
    /// 2. 산출물 디렉토리 생성
    /// 3. [`generate_sbom`](Self::generate_sbom)
    /// 4. [`scan_for_vulnerabilities`](Self::scan_for_vulnerabilities)
    /// 5. 리포트 파싱 및 집계
    ///
    /// 앞 단계가 실패하면 뒤 단계는 실행되지 않습니다.
    pub async fn run_full_scan(
        &self,
        layout: &ArtifactLayout,
        files: &[String],
    ) -> Result<ScanResult, SbomScannerError> {
        ensure_files(files)?;

        tokio::fs::create_dir_all(layout.dir())
            .await
            .map_err(|e| SbomScannerError::io(layout.dir(), e))?;

        info!(
            files = files.len(),
            dir = %layout.dir().display(),
            "starting full scan"
        );

        let sbom_path = self.generate_sbom(layout, files).await?;
        let report_path = self.scan_for_vulnerabilities(layout, &sbom_path).await?;
        let records = report::load_records(&report_path, self.config.max_report_size).await?;

        let result = ScanResult::from_records(
            records,
            Some(ScanArtifacts {
                sbom_file: sbom_path.display().to_string(),
                cve_file: report_path.display().to_string(),
            }),
        );

        metrics::counter!(m::SCAN_COMPLETED_TOTAL).increment(1);
        metrics::counter!(m::SCAN_VULNERABILITIES_FOUND_TOTAL, m::LABEL_SEVERITY => "critical")
            .increment(result.critical as u64);
        metrics::counter!(m::SCAN_VULNERABILITIES_FOUND_TOTAL, m::LABEL_SEVERITY => "high")
            .increment(result.high as u64);

        info!(
            total = result.total_vulns,
            critical = result.critical,
            high = result.high,
            "full scan completed"
        );
        Ok(result)
    }

    /// 설정된 산출물 디렉토리에서 전체 스캔을 실행합니다.
    ///
    /// 같은 디렉토리를 공유하므로 동시에 여러 번 호출하면 산출물이 덮어써집니다.
    pub async fn run_full_scan_default(
        &self,
        files: &[String],
    ) -> Result<ScanResult, SbomScannerError> {
        self.run_full_scan(&self.default_layout(), files).await
    }
}

impl<R: ToolRunner> ScanExecutor for ScanPipeline<R> {
    fn execute<'a>(
        &'a self,
        job_id: &'a str,
        files: &'a [String],
    ) -> BoxFuture<'a, Result<ScanResult, HexalabError>> {
        Box::pin(async move {
            let layout = ArtifactLayout::for_job(&self.config.artifact_dir, job_id)?;
            let result = self.run_full_scan(&layout, files).await?;
            Ok::<_, HexalabError>(result)
        })
    }

    fn discard<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Ok(layout) = ArtifactLayout::for_job(&self.config.artifact_dir, job_id) else {
                return;
            };
            match tokio::fs::remove_dir_all(layout.dir()).await {
                Ok(()) => debug!(job_id, dir = %layout.dir().display(), "job artifacts removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    job_id,
                    dir = %layout.dir().display(),
                    error = %e,
                    "failed to remove job artifacts"
                ),
            }
        })
    }
}

fn ensure_files(files: &[String]) -> Result<(), SbomScannerError> {
    if files.is_empty() {
        return Err(SbomScannerError::InvalidInput(
            "no target files provided".to_owned(),
        ));
    }
    Ok(())
}
