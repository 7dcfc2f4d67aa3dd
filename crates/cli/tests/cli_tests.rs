//! CLI integration tests

use std::process::Command;

fn iris() -> Command {
    Command::new(env!("CARGO_BIN_EXE_iris"))
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = iris()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Iris inference service"), "Should show app name");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("model"), "Should show model command");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("metrics"), "Should show metrics command");
    assert!(stdout.contains("demo"), "Should show demo command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = iris()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("iris"), "Should show binary name");
}

/// Test model subcommand help
#[test]
fn test_model_help() {
    let output = iris()
        .args(["model", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Model help should succeed");
    assert!(stdout.contains("info"), "Should show info subcommand");
    assert!(stdout.contains("reload"), "Should show reload subcommand");
}

/// Test demo subcommand help
#[test]
fn test_demo_help() {
    let output = iris()
        .args(["demo", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Demo help should succeed");
    assert!(stdout.contains("--requests"), "Should show requests option");
}

/// Predict needs exactly four features
#[test]
fn test_predict_requires_four_features() {
    let output = iris()
        .args(["predict", "5.1", "3.5", "1.4"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Three features should be rejected");
}

/// Non-numeric features are rejected before any request
#[test]
fn test_predict_rejects_text() {
    let output = iris()
        .args(["predict", "a", "b", "c", "d"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Text features should be rejected");
}

/// An unreachable service is an error, not a panic
#[test]
fn test_unreachable_service_fails() {
    let output = iris()
        .args(["--api-url", "http://127.0.0.1:1", "health"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked"));
}
