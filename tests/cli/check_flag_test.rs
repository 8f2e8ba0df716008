//! Tests for the command-line surface.

use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

#[test]
fn test_help_mentions_flags() {
    let output = Command::new(env!("CARGO_BIN_EXE_log-sentinel"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--config"), "Help should mention --config flag");
    assert!(stdout.contains("--check"), "Help should mention --check flag");
}

#[test]
fn test_check_accepts_valid_config() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [[log_files]]
        path = "/var/log/app.log"
        keywords = ["error"]

        [[notifiers]]
        type = "feishu"
        webhook = "https://example.com/hook"
        "#
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_log-sentinel"))
        .arg("--config")
        .arg(file.path())
        .arg("--check")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
}

#[test]
fn test_check_rejects_config_without_notifiers() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [[log_files]]
        path = "/var/log/app.log"
        keywords = ["error"]
        "#
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_log-sentinel"))
        .arg("--config")
        .arg(file.path())
        .arg("--check")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_missing_config_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_log-sentinel"))
        .args(["--config", "/nonexistent/log-sentinel.toml", "--check"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}
