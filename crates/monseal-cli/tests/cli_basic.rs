//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Only
//! offline commands are exercised here.

use std::process::Command;

/// Run a CLI command and return output.
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "monseal-cli", "--"])
        .args(args)
        .env("MONSEAL_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0, "help failed");
    assert!(stdout.contains("Monseal CLI"));
}

#[test]
fn test_catalog_list() {
    let (stdout, _, code) = run_cli(&["catalog", "list"]);
    assert_eq!(code, 0, "catalog list failed");
    assert!(stdout.contains("\"001\""));
    assert!(stdout.contains("requiredContributions"));
}

#[test]
fn test_catalog_show() {
    let (stdout, _, code) = run_cli(&["catalog", "show", "001"]);
    assert_eq!(code, 0, "catalog show failed");
    assert!(stdout.contains("\"monsterId\": \"001\""));
}

#[test]
fn test_catalog_show_unknown_id_fails() {
    let (_, stderr, code) = run_cli(&["catalog", "show", "999"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no monster"));
}
