use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Fast loop and a short ramp so sim runs finish quickly
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sensors]
channels = [0, 1, 2, 3]
white_is_high = true

[filter]
window = 2

[control]
rate_hz = 200.0

[safety]
loss_limit = 3

[ramp]
duration_ms = 20
steps = 4

[logging]
cycle_every = 1
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--cycles", "5"], 0, "run complete: cycles=5", "stdout")]
#[case(&["run", "--monitor", "--cycles", "3"], 0, "ramp=skipped", "stdout")]
#[case(&["run", "--cycles", "3"], 0, "center=", "stderr")]
#[case(&["run", "--cycles", "3", "--hz", "0"], 2, "rate_hz", "stderr")]
#[case(&["run", "--cycles", "3", "--speed", "1.5"], 2, "base_speed", "stderr")]
#[case(&["run", "--cycles", "2", "--stats"], 0, "Missed deadlines", "stderr")]
#[case(&["run", "--cycles", "nope"], 2, "invalid value", "stderr")]
#[case(&["self-check"], 0, "self-check ok: 4 channels", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("linetrace_cli").unwrap();

    // Always include a valid config to avoid relying on defaults
    cmd.arg("--config").arg(&cfg).env_remove("RUST_LOG");
    cmd.env("LINETRACE_SIM_LINE", "center");

    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);

    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn lost_line_latches_emergency_stop() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("linetrace_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["run", "--cycles", "5"])
        .env("LINETRACE_SIM_LINE", "lost");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("lost=5 estops=1"))
        .stderr(predicate::str::contains("emergency stop"));
}

#[test]
fn failing_reads_are_reported_as_faults() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("linetrace_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["run", "--cycles", "4"])
        .env("LINETRACE_SIM_LINE", "center")
        .env("LINETRACE_SIM_FAIL_READS", "2");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("faults=2"))
        .stderr(predicate::str::contains("fault"));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("linetrace_cli").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("What happened: Invalid configuration"));
}

#[test]
fn invalid_config_value_is_rejected_before_running() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sensors]\nchannels = [0, 1, 7]\n").unwrap();

    let mut cmd = Command::cargo_bin("linetrace_cli").unwrap();
    cmd.arg("--config").arg(&path).args(["run", "--cycles", "1"]);

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("MCP3004"));
}

#[test]
fn json_summary_has_stable_fields() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("linetrace_cli").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--cycles", "3"])
        .env_remove("RUST_LOG")
        .env("LINETRACE_SIM_LINE", "left");

    let out = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&out);
    let line = stdout
        .lines()
        .find(|l| l.contains("\"cycles\""))
        .unwrap_or_else(|| panic!("no summary line; stdout was: {stdout}"));
    let v: serde_json::Value = serde_json::from_str(line).expect("valid JSON");

    assert_eq!(v["cycles"].as_u64(), Some(3));
    assert_eq!(v["lost_cycles"].as_u64(), Some(0));
    assert_eq!(v["ramp"].as_str(), Some("completed"));
    assert_eq!(v["strategy"].as_str(), Some("centroid"));
    assert_eq!(v["cancelled"].as_bool(), Some(false));
    assert!(v["timestamp"].as_u64().is_some());
}

#[test]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("linetrace_cli").unwrap();
    cmd.arg("--json")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--hz", "5000"]);

    let out = cmd.assert().code(2).get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&out);
    let line = stdout
        .lines()
        .find(|l| l.contains("\"reason\""))
        .unwrap_or_else(|| panic!("no error line; stdout was: {stdout}"));
    let v: serde_json::Value = serde_json::from_str(line).expect("valid JSON");
    assert_eq!(v["reason"].as_str(), Some("InvalidConfig"));
    assert_eq!(v["exit_code"].as_i64(), Some(2));
    assert!(v["message"].as_str().unwrap_or("").contains("rate_hz"));
}

#[test]
fn cycle_file_receives_every_record() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("cycles.log");
    let path = dir.path().join("cfg.toml");
    fs::write(
        &path,
        format!(
            "[control]\nrate_hz = 200.0\n[ramp]\nsteps = 0\nduration_ms = 0\n[logging]\ncycle_file = {:?}\n",
            log.display().to_string()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("linetrace_cli").unwrap();
    cmd.arg("--config")
        .arg(&path)
        .args(["run", "--cycles", "4"])
        .env("LINETRACE_SIM_LINE", "center");
    cmd.assert().success();

    let text = fs::read_to_string(&log).unwrap();
    assert_eq!(text.lines().count(), 4, "{text}");
    assert!(text.lines().all(|l| l.contains("center=")));
}
