//! Integration tests for the `netcounter` CLI binary.
//!
//! Every invocation gets its own temp config location, so tests never touch
//! the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

const SESSION: &str = r#"# manager comes up after the owner asked to run
{"type":"set_running","value":true}
{"type":"availability","available":true}
{"type":"usage","service":"/net/connman/service/wifi_1","home":{"RX.Bytes":100,"TX.Bytes":40,"Time":30}}
{"type":"usage","service":"/net/connman/service/cell_1","roaming":{"RX.Bytes":7}}
{"type":"release"}
"#;

/// Build a command for the `netcounter` binary with env isolation.
fn netcounter_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netcounter");
    cmd.env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("RUST_LOG")
        .env_remove("NETCOUNTER_CONFIG")
        .env_remove("NETCOUNTER_COUNTER__ACCURACY")
        .env_remove("NETCOUNTER_COUNTER__INTERVAL")
        .env_remove("NETCOUNTER_DEFAULTS__OUTPUT")
        .arg("--config")
        .arg(config_file(dir));
    cmd
}

fn config_file(dir: &Path) -> PathBuf {
    dir.join("netcounter.toml")
}

fn write_session(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("session.jsonl");
    std::fs::write(&path, body).unwrap();
    path
}

fn replay_json(cmd: &mut assert_cmd::Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "replay failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = cargo_bin_cmd!("netcounter").output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("replay")
            .and(predicate::str::contains("config"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netcounter"));
}

#[test]
fn test_invalid_output_format() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .args(["--output", "yaml", "config", "path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("possible values").or(predicate::str::contains("invalid")));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Replay ──────────────────────────────────────────────────────────

#[test]
fn test_replay_json_report() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path(), SESSION);

    let report = replay_json(
        netcounter_cmd(dir.path())
            .args(["--output", "json", "replay"])
            .arg(&session),
    );

    assert_eq!(report["steps"], 5);
    let counter = &report["counter"];
    assert_eq!(counter["running"], true);
    assert_eq!(counter["roaming"], true);
    assert_eq!(counter["home_usage"]["bytes_in"], 100);
    assert_eq!(counter["home_usage"]["bytes_out"], 40);
    assert_eq!(counter["home_usage"]["seconds_online"], 30);
    assert_eq!(counter["roaming_usage"]["bytes_in"], 7);
    assert_eq!(counter["roaming_usage"]["bytes_out"], 0);

    let calls = report["calls"].as_array().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["call"], "register");
    assert_eq!(calls[0]["accuracy"], 1024);
    assert_eq!(calls[0]["interval"], 1);
    assert_eq!(calls[1]["call"], "unregister");

    let events = report["events"].as_array().unwrap();
    assert_eq!(events[0]["step"], 2);
    assert_eq!(events[0]["event"]["event"], "running-changed");
    let last = events.last().unwrap();
    assert!(last["step"].is_null());
    assert_eq!(last["event"]["running"], false);
}

#[test]
fn test_replay_overrides() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path(), "{\"type\":\"availability\",\"available\":true}\n");

    let report = replay_json(
        netcounter_cmd(dir.path())
            .args(["-o", "json-compact", "replay", "--start", "--accuracy", "2048", "--interval", "60"])
            .arg(&session),
    );

    assert_eq!(report["counter"]["accuracy"], 2048);
    assert_eq!(report["counter"]["interval"], 60);
    assert_eq!(report["calls"][0]["call"], "register");
    assert_eq!(report["calls"][0]["accuracy"], 2048);
    assert_eq!(report["calls"][0]["interval"], 60);
}

#[test]
fn test_replay_uses_config_file_and_env() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        config_file(dir.path()),
        "[counter]\ninterval = 15\nrunning = true\npath_prefix = \"/org/example/Counter\"\n",
    )
    .unwrap();
    let session = write_session(dir.path(), "{\"type\":\"availability\",\"available\":true}\n");

    let report = replay_json(
        netcounter_cmd(dir.path())
            .env("NETCOUNTER_COUNTER__ACCURACY", "4096")
            .args(["-o", "json", "replay"])
            .arg(&session),
    );

    let counter = &report["counter"];
    assert_eq!(counter["accuracy"], 4096);
    assert_eq!(counter["interval"], 15);
    assert_eq!(counter["running"], true);
    assert!(
        counter["path"]
            .as_str()
            .unwrap()
            .starts_with("/org/example/Counter")
    );
}

#[test]
fn test_replay_stdin_plain() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .args(["-o", "plain", "replay", "-"])
        .write_stdin(SESSION)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("2\trunning-changed\ttrue")
                .and(predicate::str::contains("5\treleased"))
                .and(predicate::str::contains("end\trunning-changed\tfalse")),
        );
}

#[test]
fn test_replay_table() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path(), SESSION);
    netcounter_cmd(dir.path())
        .args(["--color", "never", "replay"])
        .arg(&session)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Events (5 steps)")
                .and(predicate::str::contains("bytes-received-changed"))
                .and(predicate::str::contains("Manager calls"))
                .and(predicate::str::contains("unregister")),
        );
}

#[test]
fn test_replay_quiet_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path(), SESSION);
    netcounter_cmd(dir.path())
        .args(["-q", "replay"])
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_replay_malformed_session() {
    let dir = TempDir::new().unwrap();
    let session = write_session(
        dir.path(),
        "{\"type\":\"release\"}\n{\"type\":\"reboot\"}\n",
    );
    netcounter_cmd(dir.path())
        .arg("replay")
        .arg(&session)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_replay_missing_file() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .args(["replay", "does-not-exist.jsonl"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("does-not-exist.jsonl"));
}

#[test]
fn test_replay_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(config_file(dir.path()), "[counter]\nevent_capacity = 0\n").unwrap();
    let session = write_session(dir.path(), SESSION);
    netcounter_cmd(dir.path())
        .arg("replay")
        .arg(&session)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("event_capacity"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("netcounter.toml"));
}

#[test]
fn test_config_show_without_file() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[counter]")
                .and(predicate::str::contains("accuracy = 1024"))
                .and(predicate::str::contains("path_prefix = \"/ConnectivityCounter\"")),
        );
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    netcounter_cmd(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    assert!(config_file(dir.path()).exists());

    netcounter_cmd(dir.path())
        .args(["config", "init"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("already exists"));

    netcounter_cmd(dir.path())
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_defaults_select_output() {
    let dir = TempDir::new().unwrap();
    std::fs::write(config_file(dir.path()), "[defaults]\noutput = \"json\"\n").unwrap();
    let output = netcounter_cmd(dir.path())
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let cfg: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cfg["defaults"]["output"], "json");
    assert_eq!(cfg["counter"]["interval"], 1);
}
