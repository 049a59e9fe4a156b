//! CLI tests for the claude-adapter binary.
//!
//! Tests command-line interface functionality including --version and --help flags.
//!
//! Note: These tests use `cargo run` when no built binary is found.

use std::process::Command;
use std::str;

/// Get the path to the claude-adapter binary, falling back to `cargo run` for local dev.
fn get_binary_command() -> Command {
    if std::path::Path::new("target/release/claude-adapter").exists() {
        Command::new("target/release/claude-adapter")
    } else if std::path::Path::new("target/debug/claude-adapter").exists() {
        Command::new("target/debug/claude-adapter")
    } else {
        let mut cmd = Command::new("cargo");
        cmd.args(["run", "--bin", "claude-adapter", "--"]);
        cmd
    }
}

#[test]
fn test_version_flag() {
    let mut cmd = get_binary_command();
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute command");

    assert!(output.status.success(), "Version command should succeed");
    let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");
    assert!(
        stdout.contains("claude-adapter"),
        "Version output should contain 'claude-adapter', got: {}",
        stdout
    );
    assert!(
        stdout.matches(char::is_numeric).count() > 0,
        "Version output should contain a version number, got: {}",
        stdout
    );
}

#[test]
fn test_version_flag_short() {
    let mut cmd = get_binary_command();
    cmd.arg("-V");

    let output = cmd.output().expect("Failed to execute command");

    assert!(output.status.success(), "Version command should succeed");
    let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");
    assert!(
        stdout.contains("claude-adapter"),
        "Version output should contain 'claude-adapter', got: {}",
        stdout
    );
}

#[test]
fn test_help_flag() {
    let mut cmd = get_binary_command();
    cmd.arg("--help");

    let output = cmd.output().expect("Failed to execute command");

    assert!(output.status.success(), "Help command should succeed");
    let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");
    assert!(stdout.contains("USAGE"), "Help output should contain 'USAGE', got: {}", stdout);
    assert!(stdout.contains("OPTIONS"), "Help output should contain 'OPTIONS', got: {}", stdout);
    assert!(
        stdout.contains("ENVIRONMENT VARIABLES"),
        "Help output should contain 'ENVIRONMENT VARIABLES', got: {}",
        stdout
    );
}

#[test]
fn test_help_flag_short() {
    let mut cmd = get_binary_command();
    cmd.arg("-h");

    let output = cmd.output().expect("Failed to execute command");

    assert!(output.status.success(), "Help command should succeed");
    let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");
    assert!(stdout.contains("USAGE"), "Help output should contain 'USAGE', got: {}", stdout);
}

#[test]
fn test_unknown_command_exits_nonzero() {
    let mut cmd = get_binary_command();
    cmd.arg("frobnicate");

    let output = cmd.output().expect("Failed to execute command");

    assert!(!output.status.success(), "Unknown command should exit non-zero");
    let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");
    assert!(stderr.contains("Unknown command"), "stderr should explain the unknown command, got: {}", stderr);
}

#[test]
fn test_config_help_subcommand() {
    let mut cmd = get_binary_command();
    cmd.args(["config", "--help"]);

    let output = cmd.output().expect("Failed to execute command");

    assert!(output.status.success(), "config --help should succeed");
    let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");
    assert!(stdout.contains("SUBCOMMANDS"), "Should list config subcommands, got: {}", stdout);
}
