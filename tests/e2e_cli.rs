//! CLI end-to-end tests
//!
//! Tests for the scenemend command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const ENV_OVERRIDES: [&str; 5] = [
    "BAZARR_CONTAINER",
    "RADARR_HOST",
    "RADARR_KEY",
    "SONARR_HOST",
    "SONARR_KEY",
];

/// Get a command for the scenemend binary, isolated from the caller's
/// environment overrides.
#[allow(deprecated)]
fn scenemend_cmd() -> Command {
    let mut cmd = Command::cargo_bin("scenemend").unwrap();
    for var in ENV_OVERRIDES {
        cmd.env_remove(var);
    }
    cmd
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("scenemend.toml");
    fs::write(&path, body).unwrap();
    path
}

const LOG: &str = "\
2024-05-01 10:00:01,002 - root (7f12) :  ERROR (list_subtitles:120) - BAZARR ffprobe cannot analyze this video file. Could it be corrupted? /movies/Film.2020/Film.2020.mkv
2024-05-01 10:00:02,004 - root (7f12) :  ERROR (list_subtitles:120) - BAZARR file .rmvb is not a valid video extension /movies/Old.1999/Old.1999.rmvb
2024-05-01 10:00:03,005 - root (7f12) :  ERROR (list_subtitles:120) - BAZARR is not a valid video extension /movies/Film.2020/Film.2020.mkv
";

#[test]
fn test_cli_no_args_shows_help() {
    scenemend_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    scenemend_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scenemend"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    scenemend_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("scenemend "));
}

#[test]
fn test_cli_check_tools_command() {
    scenemend_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("docker"));
}

#[test]
fn test_cli_classify_builtin_rule() {
    let dir = tempdir().unwrap();
    scenemend_cmd()
        .current_dir(dir.path())
        .args(["classify", "file .rmvb is not a valid video extension"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched rule: invalid-extension"))
        .stdout(predicate::str::contains(
            "[Blacklist, Remux{onSuccess: Delete, onFail: Replace}]",
        ));
}

#[test]
fn test_cli_classify_unmatched() {
    let dir = tempdir().unwrap();
    scenemend_cmd()
        .current_dir(dir.path())
        .args(["classify", "a failure nobody has seen"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rules matched."))
        .stdout(predicate::str::contains("[Unmatched]"));
}

#[test]
fn test_cli_classify_with_config_rules() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[[rules]]
name = "quota"
pattern = "quota exceeded"
action = ["DELETE"]
"#,
    );

    scenemend_cmd()
        .args(["--config", config.to_str().unwrap()])
        .args(["classify", "disk quota exceeded"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched rule: quota"))
        .stdout(predicate::str::contains("[Delete]"));
}

#[test]
fn test_cli_plan_from_log_file() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let log = dir.path().join("bazarr.log");
    fs::write(&log, LOG).unwrap();

    scenemend_cmd()
        .args(["--config", config.to_str().unwrap()])
        .args(["plan", "--log-file", log.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("/movies/Film.2020/Film.2020.mkv"))
        .stdout(predicate::str::contains("Rule:    unreadable-video"))
        .stdout(predicate::str::contains("/movies/Old.1999/Old.1999.rmvb"))
        .stdout(predicate::str::contains("[PLAN] 2 file(s) would be handled"));
}

#[test]
fn test_cli_plan_json() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let log = dir.path().join("bazarr.log");
    fs::write(&log, LOG).unwrap();

    let output = scenemend_cmd()
        .args(["--config", config.to_str().unwrap()])
        .args(["plan", "--json", "--log-file", log.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["rule"], "invalid-extension");
    assert_eq!(records[1]["actions"][0], "BLACKLIST");
}

#[test]
fn test_cli_plan_empty_log() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let log = dir.path().join("bazarr.log");
    fs::write(&log, "2024-05-01 INFO (x:1) - BAZARR all good\n").unwrap();

    scenemend_cmd()
        .args(["--config", config.to_str().unwrap()])
        .args(["plan", "--log-file", log.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No errors found."));
}

#[test]
fn test_cli_plan_reads_stdin() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    assert_cmd::Command::from_std(scenemend_cmd())
        .args(["--config", config.to_str().unwrap()])
        .args(["plan", "--stdin"])
        .write_stdin(LOG)
        .assert()
        .success()
        .stdout(predicate::str::contains("[PLAN] 2 file(s) would be handled"));
}

#[test]
fn test_cli_validate_without_source_fails() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    scenemend_cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No log source configured"));
}

#[test]
fn test_cli_validate_complete_config() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[source]
container = "bazarr"

[[arrs]]
name = "radarr"
type = "radarr"
url = "http://localhost:7878"
api_key = "abc"

[[arrs]]
name = "sonarr"
type = "sonarr"
url = "http://localhost:8989"
api_key = "def"
"#,
    );

    scenemend_cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Configuration is valid"))
        .stdout(predicate::str::contains("docker container 'bazarr'"))
        .stdout(predicate::str::contains("(built-in)"));
}

#[test]
fn test_cli_validate_rejects_bad_action() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[[rules]]
pattern = "x"
action = ["EXPLODE"]
"#,
    );

    scenemend_cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_cli_run_requires_catalogs() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let log = dir.path().join("bazarr.log");
    fs::write(&log, LOG).unwrap();

    scenemend_cmd()
        .args(["--config", config.to_str().unwrap()])
        .args(["run", "--log-file", log.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No enabled"));
}
