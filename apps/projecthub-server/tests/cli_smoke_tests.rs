//! CLI smoke tests for the projecthub-server binary.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;

fn run_projecthub_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_projecthub-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute projecthub-server")
}

/// Config rooted in `dir` so nothing touches the real home directory.
fn write_config(dir: &Path, extra: &str) -> String {
    let home = dir.join("home");
    let content = format!(
        r#"
server:
  home_dir: "{}"
  host: "127.0.0.1"
  port: 8087

database:
  url: "sqlite://database/test.db"

logging:
  default:
    console_level: warn
    file: "logs/projecthub.log"
    file_level: info
{extra}"#,
        home.to_string_lossy().replace('\\', "/")
    );
    let path = dir.join("projecthub.yaml");
    std::fs::write(&path, content).expect("Failed to write config");
    path.to_string_lossy().to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_projecthub_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_projecthub_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("projecthub-server"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_projecthub_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Unexpected stderr: {stderr}");
}

#[test]
fn test_cli_missing_config_file() {
    let output = run_projecthub_server(&["--config", "/nonexistent/projecthub.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "Unexpected stderr: {stderr}");
}

#[test]
fn test_cli_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "server: [unclosed").expect("Failed to write file");

    let output = run_projecthub_server(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid configuration"),
        "Unexpected stderr: {stderr}"
    );
}

#[test]
fn test_cli_check_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
modules:
  chat:
    max_message_length: 500
"#,
    );

    let output = run_projecthub_server(&["--config", &config, "check"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Check should pass: {stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("Sqlite"));
    assert!(temp_dir.path().join("home").is_dir(), "home_dir is created");
}

#[test]
fn test_cli_check_rejects_bad_module_section() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
modules:
  chat:
    max_message_length: "lots"
"#,
    );

    let output = run_projecthub_server(&["--config", &config, "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("modules.chat"), "Unexpected stderr: {stderr}");
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp_dir.path(), "");

    let output = run_projecthub_server(&["--config", &config, "--port", "9191", "--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9191"), "{stdout}");
    assert!(stdout.contains("127.0.0.1:9191"), "{stdout}");
}

#[tokio::test]
async fn test_cli_run_with_mock_database_keeps_serving() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
modules:
  api_ingress:
    bind_addr: "127.0.0.1:0"
"#,
    );

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_projecthub-server"))
        .args(["--config", config.as_str(), "--mock", "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn projecthub-server");

    let early_exit = tokio::time::timeout(Duration::from_secs(2), child.wait()).await;
    assert!(
        early_exit.is_err(),
        "Server exited early: {early_exit:?}"
    );
    child.kill().await.expect("Failed to stop server");
}
