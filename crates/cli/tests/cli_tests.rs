//! CLI integration tests

use std::process::{Command, Output};

fn fermix(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fermix"))
        .args(args)
        .env_remove("FERMIX_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = fermix(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("exoplanet classification API"),
        "Should show app description"
    );
    for command in ["health", "info", "stats", "predict", "dataset"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
    assert!(stdout.contains("--api-url"), "Should show api-url option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = fermix(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("fermix"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = fermix(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("--model"), "Should show model option");
    assert!(stdout.contains("--feature"), "Should show feature option");
    assert!(stdout.contains("--json-file"), "Should show json-file option");
}

/// Test dataset subcommand help
#[test]
fn test_dataset_help() {
    let output = fermix(&["dataset", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Dataset help should succeed");
    assert!(stdout.contains("--full"), "Should show full option");
    assert!(stdout.contains("--page"), "Should show page option");
    assert!(stdout.contains("--page-size"), "Should show page-size option");
}

/// Test that an unsupported model is rejected before any request is made
#[test]
fn test_predict_rejects_unknown_model() {
    let output = fermix(&["predict", "--model", "xgboost"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Unknown model should fail");
    assert!(stderr.contains("xgboost"), "Should name the rejected value");
}

/// Test that malformed feature arguments are rejected
#[test]
fn test_predict_rejects_malformed_feature() {
    let output = fermix(&["predict", "--feature", "koi_period"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Malformed feature should fail");
    assert!(stderr.contains("name=value"), "Should explain the expected form");
}

/// Test that an invalid API URL is reported
#[test]
fn test_invalid_api_url() {
    let output = fermix(&["--api-url", "not a url", "health"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Invalid URL should fail");
    assert!(stderr.contains("Invalid API URL"), "Should report the bad URL");
}

/// Test that an unreachable server produces an error, not a hang
#[test]
fn test_unreachable_server() {
    let output = fermix(&["--api-url", "http://127.0.0.1:1", "health"]);

    assert!(!output.status.success(), "Unreachable server should fail");
}
