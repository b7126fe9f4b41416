//! Tests for the `profile-sync` binary's argument handling and exit codes.

mod common;

use std::process::Command;

use common::free_port;
use tempfile::TempDir;

fn profile_sync_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_profile-sync"));
    cmd.env("RUST_LOG", "off").env_remove("PROFILE_SYNC_LOG");
    cmd
}

/// Command pointed at a config path that does not exist, so defaults apply.
fn isolated_cmd(dir: &TempDir) -> Command {
    let mut cmd = profile_sync_cmd();
    cmd.arg("--config").arg(dir.path().join("config.toml"));
    cmd
}

#[test]
fn test_help_lists_global_options() {
    let output = profile_sync_cmd()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--api-url"));
    assert!(stdout.contains("--token"));
    assert!(stdout.contains("--user"));
    assert!(stdout.contains("set-main"));
    assert!(stdout.contains("delete-photo"));
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    let output = profile_sync_cmd()
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_activity_predicate_is_rejected() {
    let output = profile_sync_cmd()
        .args(["activities", "alice", "--predicate", "someday"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown activity predicate 'someday'"));
}

#[test]
fn test_unreachable_api_prints_notice_and_fails() {
    let dir = TempDir::new().unwrap();
    let output = isolated_cmd(&dir)
        .args(["show", "alice", "--api-url"])
        .arg(format!("http://127.0.0.1:{}/api", free_port()))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Problem loading profile"), "stderr: {}", stderr);
}

#[test]
fn test_self_edit_requires_user() {
    let dir = TempDir::new().unwrap();
    let output = isolated_cmd(&dir)
        .args(["set-main", "p1"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--user is required for 'set-main'"));
}

#[test]
fn test_edit_without_fields_fails() {
    let dir = TempDir::new().unwrap();
    let output = isolated_cmd(&dir)
        .args(["edit", "--user", "bob"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Nothing to update"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[tabs]\nfollowers = 2\nfollowing = 2\n").unwrap();

    let output = profile_sync_cmd()
        .arg("--config")
        .arg(&path)
        .args(["show", "alice"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Followers and following tabs must differ"));
}
