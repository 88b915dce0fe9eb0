//! End-to-end tests for the parintegral binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn parintegral() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("parintegral").unwrap()
}

fn stdout_value(args: &[&str]) -> f64 {
    let output = parintegral().args(args).output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    String::from_utf8(output.stdout).unwrap().trim().parse().unwrap()
}

#[test]
fn test_cos_quarter_period() {
    let value = stdout_value(&["0", "1.5707963267948966", "0.0001", "4"]);
    assert!((value - 1.0).abs() < 1e-4, "got {}", value);
}

#[test]
fn test_thread_backend_matches_process_backend() {
    let process = stdout_value(&["0", "3", "0.001", "3"]);
    let thread = stdout_value(&["0", "3", "0.001", "3", "--backend", "thread"]);
    assert_eq!(process, thread);
}

#[test]
fn test_single_worker_prints_six_decimals() {
    parintegral()
        .args(["0", "0", "0.1", "1"])
        .assert()
        .success()
        .stdout("0.000000\n");
}

#[test]
fn test_missing_arguments_prints_usage() {
    parintegral()
        .args(["0", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage: parintegral A B H WORKERS"));
}

#[test]
fn test_zero_workers_rejected() {
    parintegral()
        .args(["0", "1", "0.1", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WORKERS must be at least 1"));
}

#[test]
fn test_inverted_bounds_rejected() {
    parintegral()
        .args(["1", "0", "0.1", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration validation failed"));
}

#[test]
fn test_json_output() {
    let output = parintegral()
        .args(["0", "1", "0.01", "2", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["integrand"], "cos(x)");
    assert_eq!(doc["request"]["workers"], 2);
    assert_eq!(doc["partials"].as_array().unwrap().len(), 2);
    let result = doc["result"].as_f64().unwrap();
    assert!((result - 1f64.sin()).abs() < 1e-2);
}

#[test]
fn test_config_file_with_override() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("run.toml");
    let json = dir.path().join("out.json");
    std::fs::write(
        &config,
        "[integral]\nlower = 0.0\nupper = 1.0\nstep = 0.001\nworkers = 2\n\n[runtime]\nbackend = \"thread\"\n",
    )
    .unwrap();

    parintegral()
        .args(["--config", config.to_str().unwrap()])
        .arg("--json-output")
        .arg(&json)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0.84"));

    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(doc["request"]["backend"], "thread");
}

#[test]
fn test_dry_run() {
    parintegral()
        .args(["0", "1", "0.1", "3", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run mode"));
}
