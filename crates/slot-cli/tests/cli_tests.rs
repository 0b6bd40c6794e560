//! Integration tests for the `slot` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to drive the normalize, check,
//! add, list, and audit subcommands against a JSON store in a temp directory.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A temp working directory with a `slot.toml` pointing at `events.json`.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("slot.toml"),
            "[store]\npath = \"events.json\"\n\n[log]\nlevel = \"warn\"\n",
        )
        .expect("write config");
        Self { dir }
    }

    fn with_events(json: &str) -> Self {
        let ws = Self::new();
        std::fs::write(ws.store_path(), json).expect("write store");
        ws
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("events.json")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn slot(&self) -> Command {
        let mut cmd = Command::cargo_bin("slot").unwrap();
        cmd.current_dir(self.path()).env_remove("RUST_LOG");
        cmd
    }

    fn stored(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.store_path()).expect("store file must exist");
        serde_json::from_str(&text).expect("store must be valid JSON")
    }
}

const ONE_EVENT: &str = r#"[
  {"id": "1", "title": "Standup", "start": "2024-01-01T10:00:00", "end": "2024-01-01T10:30:00",
   "isRecurring": false, "recurringDays": []}
]"#;

// ─────────────────────────────────────────────────────────────────────────────
// normalize
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn normalize_prints_canonical_interval() {
    let ws = Workspace::new();

    let output = ws
        .slot()
        .args(["normalize", "--start", "2024-01-01T10:15", "--duration", "30"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["start"], "2024-01-01T10:15:00");
    assert_eq!(json["end"], "2024-01-01T10:45:00");
}

#[test]
fn normalize_uses_configured_default_duration() {
    let ws = Workspace::new();

    ws.slot()
        .args(["normalize", "--start", "2024-01-01T10:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-01T10:30:00"));
}

#[test]
fn normalize_zero_duration_fails() {
    let ws = Workspace::new();

    ws.slot()
        .args(["normalize", "--start", "2024-01-01T10:00", "--duration", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid duration"));
}

#[test]
fn invalid_duration_suggests_configured_presets() {
    let ws = Workspace::new();

    ws.slot()
        .args(["normalize", "--start", "2024-01-01T10:00", "--duration", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "try one of: 15, 30, 45, 60, 90, 120 minutes",
        ));

    std::fs::write(
        ws.path().join("slot.toml"),
        "[store]\npath = \"events.json\"\n\n[ui]\nduration_presets = [20, 40]\n",
    )
    .unwrap();

    ws.slot()
        .args([
            "add", "--title", "Odd", "--start", "2024-01-01T10:00", "--duration", "12.5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("try one of: 20, 40 minutes"));
    assert!(!ws.store_path().exists());
}

#[test]
fn normalize_bad_start_fails() {
    let ws = Workspace::new();

    ws.slot()
        .args(["normalize", "--start", "next tuesday", "--duration", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid instant"));
}

// ─────────────────────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_reports_overlap() {
    let ws = Workspace::with_events(ONE_EVENT);

    let output = ws
        .slot()
        .args(["check", "--start", "2024-01-01T10:15", "--duration", "30"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let verdict: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(verdict["conflict"], true);
    assert_eq!(
        verdict["message"],
        "This time slot conflicts with an existing event"
    );
    assert_eq!(verdict["conflicts"][0]["id"], "1");
    assert_eq!(verdict["conflicts"][0]["overlapMinutes"], 15);
}

#[test]
fn check_accepts_back_to_back() {
    let ws = Workspace::with_events(ONE_EVENT);

    let output = ws
        .slot()
        .args(["check", "--start", "2024-01-01T10:30", "--duration", "30"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let verdict: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(verdict["conflict"], false);
    assert!(verdict.get("message").is_none());
}

#[test]
fn check_without_store_file_never_conflicts() {
    let ws = Workspace::new();

    ws.slot()
        .args(["check", "--start", "2024-01-01T10:15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"conflict\": false"));
}

// ─────────────────────────────────────────────────────────────────────────────
// add
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn add_creates_event_in_store() {
    let ws = Workspace::new();

    ws.slot()
        .args([
            "add", "--title", "  Planning ", "--start", "2024-01-01T09:00", "--duration", "45",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Planning\""));

    let stored = ws.stored();
    let events = stored.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], "1");
    assert_eq!(events[0]["start"], "2024-01-01T09:00:00");
    assert_eq!(events[0]["end"], "2024-01-01T09:45:00");
    assert_eq!(events[0]["isRecurring"], false);
    assert_eq!(events[0]["recurringDays"], serde_json::json!([]));
}

#[test]
fn add_overlapping_event_fails_and_leaves_store_alone() {
    let ws = Workspace::with_events(ONE_EVENT);

    ws.slot()
        .args([
            "add", "--title", "Clash", "--start", "2024-01-01T10:15", "--duration", "30",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "This time slot conflicts with an existing event",
        ));

    assert_eq!(ws.stored().as_array().unwrap().len(), 1);
}

#[test]
fn add_back_to_back_event_succeeds() {
    let ws = Workspace::with_events(ONE_EVENT);

    ws.slot()
        .args([
            "add", "--title", "Next", "--start", "2024-01-01T10:30", "--duration", "30",
        ])
        .assert()
        .success();

    let stored = ws.stored();
    let events = stored.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1]["id"], "2");
}

#[test]
fn add_recurring_event_keeps_days() {
    let ws = Workspace::new();

    ws.slot()
        .args([
            "add",
            "--title",
            "Gym",
            "--start",
            "2024-01-01T18:00",
            "--duration",
            "60",
            "--recurring",
            "--days",
            "thursday,Monday",
        ])
        .assert()
        .success();

    let stored = ws.stored();
    assert_eq!(stored[0]["isRecurring"], true);
    assert_eq!(stored[0]["recurringDays"], serde_json::json!(["Monday", "Thursday"]));
}

#[test]
fn add_days_without_recurring_is_a_usage_error() {
    let ws = Workspace::new();

    ws.slot()
        .args([
            "add", "--title", "Gym", "--start", "2024-01-01T18:00", "--days", "Monday",
        ])
        .assert()
        .failure();

    assert!(!ws.store_path().exists());
}

#[test]
fn add_blank_title_fails() {
    let ws = Workspace::new();

    ws.slot()
        .args(["add", "--title", "   ", "--start", "2024-01-01T18:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("title must not be empty"));
}

#[test]
fn add_refuses_to_overwrite_non_array_store() {
    let ws = Workspace::with_events(r#"{"error": "backend down"}"#);

    ws.slot()
        .args(["add", "--title", "X", "--start", "2024-01-01T18:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create event. Please try again."));

    assert_eq!(
        std::fs::read_to_string(ws.store_path()).unwrap(),
        r#"{"error": "backend down"}"#
    );
}

#[test]
fn configured_conflict_message_is_used() {
    let ws = Workspace::with_events(ONE_EVENT);
    std::fs::write(
        ws.path().join("custom.toml"),
        "[store]\npath = \"events.json\"\n\n[ui]\nconflict_message = \"Slot taken\"\n",
    )
    .unwrap();

    ws.slot()
        .args([
            "--config",
            "custom.toml",
            "add",
            "--title",
            "Clash",
            "--start",
            "2024-01-01T10:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Slot taken"));
}

// ─────────────────────────────────────────────────────────────────────────────
// list / audit
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn list_prints_events_in_start_order_and_skips_malformed() {
    let ws = Workspace::with_events(
        r#"[
          {"id": 2, "name": "Late", "start_time": "2024-01-01T15:00:00", "end_time": "2024-01-01T16:00:00"},
          {"id": 3, "name": "Broken", "start_time": "2024-01-01T12:00:00"},
          {"id": 1, "name": "Early", "start_time": "2024-01-01T09:00:00", "end_time": "2024-01-01T09:30:00"}
        ]"#,
    );

    let output = ws.slot().arg("list").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "1\t2024-01-01T09:00 - 09:30\tEarly");
    assert_eq!(lines[1], "2\t2024-01-01T15:00 - 16:00\tLate");
}

#[test]
fn store_flag_overrides_config() {
    let ws = Workspace::new();
    std::fs::write(ws.path().join("other.json"), ONE_EVENT).unwrap();

    ws.slot()
        .args(["--store", "other.json", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Standup"));
}

#[test]
fn audit_clean_store_succeeds() {
    let ws = Workspace::with_events(ONE_EVENT);

    ws.slot()
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("No overlapping events."));
}

#[test]
fn audit_reports_existing_overlaps() {
    let ws = Workspace::with_events(
        r#"[
          {"id": "a", "title": "One", "start": "2024-01-01T10:00", "end": "2024-01-01T11:00"},
          {"id": "b", "title": "Two", "start": "2024-01-01T10:30", "end": "2024-01-01T11:30"}
        ]"#,
    );

    ws.slot()
        .arg("audit")
        .assert()
        .failure()
        .stdout(predicate::str::contains("a (2024-01-01T10:00 - 11:00) overlaps b"))
        .stderr(predicate::str::contains("1 overlapping pair(s) found"));
}
