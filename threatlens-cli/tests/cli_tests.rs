//! End-to-end tests for the `threatlens` binary.
//!
//! Each test runs the compiled binary against files in a temp directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const AUTH_LOG: &str = "\
Jan 10 07:30:01 bastion sshd[1001]: Failed password for admin from 1.2.3.4 port 50001 ssh2
Jan 10 07:30:05 bastion sshd[1001]: Failed password for admin from 1.2.3.4 port 50002 ssh2
Jan 10 07:30:09 bastion sshd[1001]: Failed password for admin from 1.2.3.4 port 50003 ssh2
Jan 10 07:35:12 bastion sudo:    admin : TTY=pts/0 ; PWD=/home/admin ; USER=root ; COMMAND=/bin/bash
";

fn threatlens(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_threatlens"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "off")
        .env_remove("NO_COLOR")
        .output()
        .expect("binary should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

#[test]
fn test_analyze_json_output() {
    let dir = TempDir::new().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    fs::write(&log, AUTH_LOG).expect("should write log");

    let output = threatlens(
        &dir.path().join("missing.toml"),
        &["analyze", log.to_str().expect("utf-8 path"), "--output", "json"],
    );
    assert!(output.status.success(), "analyze should succeed: {output:?}");

    let report = stdout_json(&output);
    assert_eq!(report["format"], "linux");
    assert_eq!(report["entries"], 4);

    let findings = report["findings"].as_array().expect("findings array");
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0]["category"], "Brute Force");
    assert_eq!(findings[0]["severity"], "medium");
    assert_eq!(findings[0]["mitre_id"], "T1110");
    assert_eq!(findings[1]["category"], "Privilege Escalation");
    assert_eq!(findings[1]["user"], "admin");
    assert!(report.get("advice").is_none());
}

#[test]
fn test_analyze_with_advice_and_min_severity() {
    let dir = TempDir::new().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    fs::write(&log, AUTH_LOG).expect("should write log");

    let output = threatlens(
        &dir.path().join("missing.toml"),
        &[
            "analyze",
            log.to_str().expect("utf-8 path"),
            "--min-severity",
            "medium",
            "--advise",
            "--output",
            "json",
        ],
    );
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["findings"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["advice"]["priority"], "unknown");
}

#[test]
fn test_analyze_missing_file_is_io_error() {
    let dir = TempDir::new().expect("should create temp dir");
    let output = threatlens(
        &dir.path().join("missing.toml"),
        &["analyze", "/nonexistent/threatlens/auth.log"],
    );
    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn test_analyze_file_over_size_limit() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = dir.path().join("threatlens.toml");
    fs::write(&config, "[detection]\nmax_input_size = 16\n").expect("should write config");
    let log = dir.path().join("auth.log");
    fs::write(&log, AUTH_LOG).expect("should write log");

    let output = threatlens(&config, &["analyze", log.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("too large"), "stderr: {stderr}");
}

#[test]
fn test_analyze_invalid_min_severity() {
    let dir = TempDir::new().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    fs::write(&log, AUTH_LOG).expect("should write log");

    let output = threatlens(
        &dir.path().join("missing.toml"),
        &["analyze", log.to_str().expect("utf-8 path"), "--min-severity", "critical"],
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_rules_list_json() {
    let dir = TempDir::new().expect("should create temp dir");
    let output = threatlens(
        &dir.path().join("missing.toml"),
        &["rules", "list", "--source", "host_auth", "--output", "json"],
    );
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["total"], 6);
    assert_eq!(report["rules"][0]["technique"], "T1110");
}

#[test]
fn test_config_validate_invalid_exit_code() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = dir.path().join("threatlens.toml");
    fs::write(&config, "[general]\nlog_level = \"verbose\"\n").expect("should write config");

    let output = threatlens(&config, &["config", "validate", "--output", "json"]);
    assert_eq!(output.status.code(), Some(2));

    let report = stdout_json(&output);
    assert_eq!(report["valid"], false);
    assert!(
        report["errors"][0]
            .as_str()
            .is_some_and(|e| e.contains("general.log_level"))
    );
}

#[test]
fn test_config_validate_valid() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = dir.path().join("threatlens.toml");
    fs::write(&config, "[report]\ntop_ips = 5\n").expect("should write config");

    let output = threatlens(&config, &["config", "validate"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("VALID"));
}

#[test]
fn test_config_show_section_json() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = dir.path().join("threatlens.toml");
    fs::write(&config, "[report]\ntop_ips = 5\n").expect("should write config");

    let output = threatlens(
        &config,
        &["config", "show", "--section", "report", "--output", "json"],
    );
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["section"], "report");
    assert_eq!(report["config"]["top_ips"], 5);
    assert_eq!(report["config"]["min_severity"], "info");
}
