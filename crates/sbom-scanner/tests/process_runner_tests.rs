//! ProcessToolRunner tests against shell-script stand-ins for the real tools
//!
//! The scripts mimic the tool contract: the SBOM generator prints a document on
//! stdout, the vulnerability scanner prints a report with top-level `matches`.
//! Tests run serially so no concurrent fork holds a script open for writing.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serial_test::serial;

use hexalab_sbom_scanner::{
    ArtifactLayout, ProcessToolRunner, SbomScannerConfigBuilder, SbomScannerError, ScanPipeline,
    ToolRunner,
};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
#[serial]
async fn combined_output_is_captured_on_success() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "tool", "echo out-line\necho err-line >&2\nexit 0");
    let out = tmp.path().join("combined.txt");

    ProcessToolRunner::new()
        .run(&script, &[], &out)
        .await
        .unwrap();

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.contains("out-line"));
    assert!(content.contains("err-line"));
}

#[tokio::test]
#[serial]
async fn arguments_are_passed_verbatim() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "echo-args", r#"for a in "$@"; do echo "[$a]"; done"#);
    let out = tmp.path().join("args.txt");

    let args = vec!["a b".to_owned(), "-o".to_owned(), "$HOME".to_owned()];
    ProcessToolRunner::new().run(&script, &args, &out).await.unwrap();

    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content, "[a b]\n[-o]\n[$HOME]\n");
}

#[tokio::test]
#[serial]
async fn non_zero_exit_keeps_diagnostics() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "failing", "echo 'db unavailable' >&2\nexit 3");
    let out = tmp.path().join("failed.txt");

    let err = ProcessToolRunner::new()
        .run(&script, &[], &out)
        .await
        .unwrap_err();

    match err {
        SbomScannerError::ToolExecution {
            exit_code,
            output_path,
            ..
        } => {
            assert_eq!(exit_code, Some(3));
            assert_eq!(output_path, out.display().to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(std::fs::read_to_string(&out).unwrap().contains("db unavailable"));
}

#[tokio::test]
#[serial]
async fn existing_output_is_overwritten() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "short", "echo new");
    let out = tmp.path().join("out.txt");
    std::fs::write(&out, "old content that is longer than the new one\n").unwrap();

    ProcessToolRunner::new().run(&script, &[], &out).await.unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "new\n");
}

#[tokio::test]
#[serial]
async fn non_executable_file_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("plain");
    std::fs::write(&path, "not a program").unwrap();

    let err = ProcessToolRunner::new()
        .run(&path, &[], &tmp.path().join("out.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, SbomScannerError::ToolNotFound { .. }));
}

#[tokio::test]
#[serial]
async fn timeout_kills_the_tool() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "slow", "sleep 30");

    let err = ProcessToolRunner::new()
        .with_timeout(Some(Duration::from_millis(200)))
        .run(&script, &[], &tmp.path().join("out.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, SbomScannerError::ToolTimeout { .. }));
}

#[tokio::test]
#[serial]
async fn full_scan_with_stand_in_tools() {
    let tmp = tempfile::tempdir().unwrap();
    let syft = write_script(
        tmp.path(),
        "syft",
        r#"echo '{"bomFormat":"CycloneDX","components":[]}'"#,
    );
    let grype = write_script(
        tmp.path(),
        "grype",
        r#"case "$1" in
  sbom:*) ;;
  *) echo "unexpected input $1" >&2; exit 2 ;;
esac
cat <<'EOF'
{"matches":[
 {"vulnerability":{"id":"CVE-2024-0001","severity":"Critical","dataSource":"https://nvd/1"},
  "artifact":{"name":"libfoo","version":"1.0"}},
 {"vulnerability":{"id":"CVE-2024-0002","severity":"High","url":"https://ref/2"},
  "artifact":{"name":"libbar","version":"2.0"}},
 {"vulnerability":{"id":"CVE-2024-0003","severity":"Low"},
  "artifact":{"name":"libbaz","version":"3.0"}}
]}
EOF"#,
    );

    let config = SbomScannerConfigBuilder::new()
        .sbom_tool_path(syft.display().to_string())
        .vuln_tool_path(grype.display().to_string())
        .artifact_dir(tmp.path().join("artifacts").display().to_string())
        .build()
        .unwrap();
    let pipeline = ScanPipeline::from_config(config).unwrap();
    let layout = ArtifactLayout::new(tmp.path().join("artifacts"));

    let result = pipeline
        .run_full_scan(&layout, &["/data/app.tar".to_owned()])
        .await
        .unwrap();

    assert_eq!(result.total_vulns, 3);
    assert_eq!(result.critical, 1);
    assert_eq!(result.high, 1);
    assert_eq!(result.vulnerabilities[1].url.as_deref(), Some("https://ref/2"));
    assert!(layout.sbom_path().exists());
}
