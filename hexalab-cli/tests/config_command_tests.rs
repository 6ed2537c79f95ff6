//! Integration tests for `hexalab config` inputs.
//!
//! Exercises config loading and section serialization with real TOML files.

use std::fs;
use tempfile::TempDir;

use hexalab_core::config::HexalabConfig;

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("hexalab.toml");

    let valid_config = r#"
[general]
log_level = "info"
log_format = "json"
data_dir = "/srv/scans"

[scanner]
sbom_tool_path = "/opt/bin/syft"
vuln_tool_path = "/opt/bin/grype"

[queue]
workers = 4
capacity = 32

[server]
upload_dir = "/srv/scans/uploads"
"#;

    fs::write(&config_path, valid_config).expect("should write config");

    // When: Loading the config
    let config = HexalabConfig::load(&config_path)
        .await
        .expect("valid config should load successfully");

    // Then: File values and defaults are merged
    assert_eq!(config.general.data_dir, "/srv/scans");
    assert_eq!(config.scanner.sbom_tool_path, "/opt/bin/syft");
    assert_eq!(config.queue.workers, 4);
    assert_eq!(config.queue.capacity, 32);
    assert_eq!(config.scanner.sbom_output_format, "cyclonedx-json");
    assert_eq!(config.server.upload_dir, "/srv/scans/uploads");
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");

    fs::write(&config_path, "[general\nlog_level = \"info\"\n").expect("should write bad config");

    let result = HexalabConfig::load(&config_path).await;
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
async fn test_config_validate_missing_file() {
    let config_path = std::path::PathBuf::from("/nonexistent/hexalab.toml");

    let err = HexalabConfig::load(&config_path)
        .await
        .expect_err("missing file should fail to load");
    assert!(err.to_string().contains("/nonexistent/hexalab.toml"));
}

#[tokio::test]
async fn test_config_validate_empty_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("empty.toml");

    fs::write(&config_path, "").expect("should write empty file");

    let config = HexalabConfig::load(&config_path)
        .await
        .expect("empty config should use defaults");
    assert_eq!(config.queue.workers, 2);
    assert!(!config.metrics.enabled, "metrics should be disabled by default");
}

#[tokio::test]
async fn test_config_validate_relative_tool_path() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("hexalab.toml");

    fs::write(&config_path, "[scanner]\nsbom_tool_path = \"syft\"\n").expect("should write config");

    let err = HexalabConfig::load(&config_path)
        .await
        .expect_err("relative tool path must be rejected");
    assert!(err.to_string().contains("scanner.sbom_tool_path"));
}

#[tokio::test]
async fn test_config_validate_upload_dir_outside_data_dir() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("hexalab.toml");

    let config = r#"
[general]
data_dir = "/srv/scans"

[server]
upload_dir = "/tmp/uploads"
"#;
    fs::write(&config_path, config).expect("should write config");

    let err = HexalabConfig::load(&config_path)
        .await
        .expect_err("upload_dir outside data_dir must be rejected");
    assert!(err.to_string().contains("server.upload_dir"));

    // Without the restriction the same layout is accepted
    fs::write(
        &config_path,
        format!("{config}\n[queue]\nrestrict_to_data_dir = false\n"),
    )
    .expect("should write config");
    HexalabConfig::load(&config_path)
        .await
        .expect("unrestricted config should load");
}

#[tokio::test]
async fn test_config_show_section_round_trips() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("hexalab.toml");

    let full_config = r#"
[server]
listen_addr = "127.0.0.1"
port = 9090
cors_origins = ["https://app.example.com"]
max_upload_bytes = 1048576
upload_dir = "/data/incoming"
"#;
    fs::write(&config_path, full_config).expect("should write config");

    let config = HexalabConfig::load(&config_path)
        .await
        .expect("config should load");

    // The section rendered by `config show --section server` parses back to the same values
    let rendered = toml::to_string_pretty(&config.server).expect("section should serialize");
    let reparsed: toml::Value = toml::from_str(&rendered).expect("rendered section is TOML");

    assert_eq!(reparsed["port"].as_integer(), Some(9090));
    assert_eq!(reparsed["upload_dir"].as_str(), Some("/data/incoming"));
    assert_eq!(
        reparsed["cors_origins"][0].as_str(),
        Some("https://app.example.com")
    );
}
