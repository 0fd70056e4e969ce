//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a scratch directory,
//! so each test gets its own config file and database.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_nudgewatch"))
        .args(args)
        .env("HOME", home)
        .env_remove("NUDGEWATCH_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

#[test]
fn test_config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(home.path(), &["config", "set", "gating.cooldown_minutes", "45"]).trim(), "ok");
    assert_eq!(run_ok(home.path(), &["config", "get", "gating.cooldown_minutes"]).trim(), "45");

    let listing = run_ok(home.path(), &["config", "list"]);
    assert!(listing.contains("gating.cooldown_minutes = 45"));
    assert!(listing.contains("snooze.item_minutes = 240"));
}

#[test]
fn test_config_rejects_unknown_key_and_bad_value() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "gating.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(home.path(), &["config", "set", "snooze.item_minutes", "0"]);
    assert_eq!(code, 1);
    assert_eq!(run_ok(home.path(), &["config", "get", "snooze.item_minutes"]).trim(), "240");
}

#[test]
fn test_config_reset_and_validate() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["config", "set", "scheduler.interval_minutes", "5"]);
    run_ok(home.path(), &["config", "reset"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "scheduler.interval_minutes"]).trim(), "15");
    assert!(run_ok(home.path(), &["config", "validate"]).starts_with("config ok"));
}

#[test]
fn test_gate_check_quiet_hours_and_daytime() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["config", "set", "gating.utc_offset_minutes", "0"]);

    let night = run_ok(home.path(), &["gate", "check", "--at", "2026-03-04T23:30:00Z"]);
    assert!(night.starts_with("blocked: quiet hours"), "{night}");

    let noon = run_ok(home.path(), &["gate", "check", "--at", "2026-03-04T12:00:00Z"]);
    assert_eq!(noon.trim(), "proceed");
}

#[test]
fn test_gate_check_rejects_bad_timestamp() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["gate", "check", "--at", "noonish"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid --at"));
}

#[test]
fn test_pause_blocks_gate_until_resume() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["config", "set", "gating.utc_offset_minutes", "0"]);
    assert_eq!(run_ok(home.path(), &["pause"]).trim(), "Paused");

    let blocked = run_ok(home.path(), &["gate", "check", "--at", "2026-03-04T12:00:00Z"]);
    assert_eq!(blocked.trim(), "blocked: paused by user");

    assert_eq!(run_ok(home.path(), &["resume"]).trim(), "Resumed");
    let open = run_ok(home.path(), &["gate", "check", "--at", "2026-03-04T12:00:00Z"]);
    assert_eq!(open.trim(), "proceed");
}

#[test]
fn test_snooze_add_list_remove() {
    let home = tempfile::tempdir().unwrap();
    let added = run_ok(home.path(), &["snooze", "add", "email", "thread-1", "--minutes", "30"]);
    assert!(added.starts_with("snoozed email thread-1 until"));

    let listed = run_ok(home.path(), &["snooze", "list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
    assert_eq!(parsed[0]["source_id"], "thread-1");

    assert_eq!(
        run_ok(home.path(), &["snooze", "remove", "mail", "thread-1"]).trim(),
        "unsnoozed email thread-1"
    );
    assert_eq!(run_ok(home.path(), &["snooze", "list"]).trim(), "nothing snoozed");
}

#[test]
fn test_snooze_rejects_unknown_kind() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["snooze", "add", "fax", "x"]);
    assert_ne!(code, 0);
}

#[test]
fn test_action_identifiers() {
    let home = tempfile::tempdir().unwrap();
    let snoozed = run_ok(home.path(), &["action", "snooze_task:t-1"]);
    assert!(snoozed.starts_with("Snoozed task t-1 until"));

    let all = run_ok(home.path(), &["action", "snooze_all"]);
    assert_eq!(all.trim(), "Nothing to snooze: no decided cycle yet");

    let handled = run_ok(home.path(), &["action", "mark_handled:thread-9"]);
    assert_eq!(handled.trim(), "Marked conversation thread-9 as handled");

    let (_, stderr, code) = run_cli(home.path(), &["action", "run_now"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("daemon"));

    let (_, _, code) = run_cli(home.path(), &["action", "launch_rockets"]);
    assert_eq!(code, 1);
}

#[test]
fn test_history_and_tracking_empty() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(home.path(), &["history"]).trim(), "no check-ins yet");
    assert_eq!(run_ok(home.path(), &["history", "--json", "--limit", "3"]).trim(), "[]");
    assert_eq!(run_ok(home.path(), &["tracking", "list", "--json"]).trim(), "[]");
}
